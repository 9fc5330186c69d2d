pub mod api;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod fees;
pub mod notices;
pub mod profile;
pub mod registration;
pub mod session;
pub mod supabase;

use assistant::AssistantClient;
use config::Config;
use supabase::SupabaseClient;

pub struct AppState {
    pub config: Config,
    pub supabase: SupabaseClient,
    pub assistant: Option<AssistantClient>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let assistant = AssistantClient::from_config(&config.assistant)?;
        Ok(Self {
            config,
            supabase,
            assistant,
        })
    }
}
