//! certsmith: renders a certificate per participant from a template image and a
//! spreadsheet, stamps verification QR codes on them and emails them out.
//!
//! The engine modules (`render`, `batch`, `qr`, `delivery`, `archive`, `dataset`)
//! are plain synchronous Rust. `services` exposes them over HTTP with actix-web,
//! running long work as background jobs tracked by `job_controller`.

pub mod archive;
pub mod batch;
pub mod cancel;
pub mod config;
pub mod dataset;
pub mod delivery;
pub mod error;
pub mod job_controller;
pub mod qr;
pub mod render;
pub mod services;
pub mod session;

use crate::config::Config;
use crate::job_controller::state::JobsState;
use crate::render::fonts::FontChain;
use crate::render::Renderer;
use crate::session::SessionsState;
use actix_web::web;

/// Everything the handlers pull out of the app data.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub jobs: web::Data<JobsState>,
    pub sessions: web::Data<SessionsState>,
    pub renderer: web::Data<Renderer>,
}

impl AppState {
    /// Resolves the font once and roots session directories at `config.output_dir`.
    pub fn new(config: Config, jobs: JobsState) -> Self {
        let renderer = Renderer::new(&FontChain::from_dir(&config.fonts_dir));
        Self::with_renderer(config, jobs, renderer)
    }

    pub fn with_renderer(config: Config, jobs: JobsState, renderer: Renderer) -> Self {
        let sessions = SessionsState::new(config.output_dir.clone());
        Self {
            config: web::Data::new(config),
            jobs: web::Data::new(jobs),
            sessions: web::Data::new(sessions),
            renderer: web::Data::new(renderer),
        }
    }

    /// Installs the app data and every route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().limit(self.config.json_limit_bytes))
            .app_data(self.config.clone())
            .app_data(self.jobs.clone())
            .app_data(self.sessions.clone())
            .app_data(self.renderer.clone());
        services::configure(cfg);
    }
}
