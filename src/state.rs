use propdesk_config::ServerConfig;

#[derive(Clone, Debug)]
pub struct AppState {
    pub server: ServerConfig,
}

pub fn init_app_state() -> AppState {
    AppState {
        server: ServerConfig::from_env(),
    }
}
