use actix_web::{App, HttpServer};
use certsmith::config::Config;
use certsmith::job_controller::state::{start_job_updater, JobsState};
use certsmith::AppState;
use env_logger::Env;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::from_env();
    let url = config.bind_url();
    let bind = (config.host.clone(), config.port);

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    info!(
        "Writing certificates under {}, SMTP via {}:{}",
        config.output_dir.display(),
        config.smtp.host,
        config.smtp.port
    );
    let state = AppState::new(config, jobs_state);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        let state = state.clone();
        App::new().configure(move |cfg| state.configure(cfg))
    })
    .bind(bind)?
    .run()
    .await
}
