use mentor_chat_service::api;
use mentor_chat_service::common::error_log::ErrorLog;
use mentor_chat_service::common::init;
use mentor_chat_service::settings::AppSettings;
use mentor_chat_service::workers::daemons::payments_consumer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::get();
    let error_log = ErrorLog::new(settings.error_log_capacity);
    init::initialize_logging(settings, &error_log);
    match settings.app_component.as_str() {
        "api" => api::serve(settings, error_log).await,
        "payments-consumer" => payments_consumer::serve(settings, error_log).await,
        component => anyhow::bail!("Unknown app component: {component}"),
    }
}
