use serde::Deserialize;
use serde_json::{json, Value};

use super::AppContext;
use crate::error::LauncherError;
use crate::models::{ApiResponse, AppSettings, FlagSet, FlagsConfig, InstanceId};
use crate::presence::Presence;
use crate::store::FlagStore;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One request from the UI boundary, e.g. `{"command":"kill","id":"..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AppCommand {
    Launch {
        #[serde(default)]
        flags: FlagSet,
    },
    KillAll,
    Kill {
        id: InstanceId,
    },
    GetStatus,
    GetSettings,
    SetSettings {
        settings: AppSettings,
    },
    UpdateSettings {
        patch: Value,
    },
    GetFlags,
    SetFlags {
        config: FlagsConfig,
    },
    SaveFlags,
    ResetFlags,
    ValidateFlags {
        json: String,
    },
    ImportFlags {
        json: String,
    },
    ExportFlags,
    ApplyPreset {
        id: String,
    },
    ListPresets,
    UpdatePresence {
        presence: Presence,
    },
    ClearPresence,
    GetPresenceStatus,
    GetVersion,
    OpenExternal {
        url: String,
    },
    MinimizeWindow,
    MaximizeWindow,
    CloseWindow,
}

impl AppCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AppCommand::Launch { .. } => "launch",
            AppCommand::KillAll => "kill_all",
            AppCommand::Kill { .. } => "kill",
            AppCommand::GetStatus => "get_status",
            AppCommand::GetSettings => "get_settings",
            AppCommand::SetSettings { .. } => "set_settings",
            AppCommand::UpdateSettings { .. } => "update_settings",
            AppCommand::GetFlags => "get_flags",
            AppCommand::SetFlags { .. } => "set_flags",
            AppCommand::SaveFlags => "save_flags",
            AppCommand::ResetFlags => "reset_flags",
            AppCommand::ValidateFlags { .. } => "validate_flags",
            AppCommand::ImportFlags { .. } => "import_flags",
            AppCommand::ExportFlags => "export_flags",
            AppCommand::ApplyPreset { .. } => "apply_preset",
            AppCommand::ListPresets => "list_presets",
            AppCommand::UpdatePresence { .. } => "update_presence",
            AppCommand::ClearPresence => "clear_presence",
            AppCommand::GetPresenceStatus => "get_presence_status",
            AppCommand::GetVersion => "get_version",
            AppCommand::OpenExternal { .. } => "open_external",
            AppCommand::MinimizeWindow => "minimize_window",
            AppCommand::MaximizeWindow => "maximize_window",
            AppCommand::CloseWindow => "close_window",
        }
    }
}

fn to_data<T: serde::Serialize>(value: T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::failed(e.to_string()),
    }
}

fn done(result: Result<(), LauncherError>) -> ApiResponse {
    match result {
        Ok(()) => ApiResponse::ok_empty(),
        Err(e) => e.into(),
    }
}

/// Parse one request line. Unparseable requests become a failed envelope.
pub fn parse_command(line: &str) -> Result<AppCommand, ApiResponse> {
    serde_json::from_str(line)
        .map_err(|e| ApiResponse::failed(LauncherError::ParseFailure(e.to_string()).to_string()))
}

/// Execute `command` against `ctx`. Never fails; errors travel in the
/// envelope.
pub async fn handle(ctx: &AppContext, command: AppCommand) -> ApiResponse {
    tracing::debug!("Handling command {}", command.name());

    match command {
        AppCommand::Launch { flags } => match ctx.launch(flags).await {
            Ok(id) => ApiResponse::ok(json!({ "id": id })),
            Err(e) => e.into(),
        },
        AppCommand::KillAll => {
            ctx.kill_all().await;
            ApiResponse::ok_empty()
        }
        AppCommand::Kill { id } => ApiResponse::ok(json!(ctx.kill(&id))),
        AppCommand::GetStatus => to_data(ctx.status()),

        AppCommand::GetSettings => to_data(ctx.settings().await.get()),
        AppCommand::SetSettings { settings } => done(ctx.replace_settings(settings).await),
        AppCommand::UpdateSettings { patch } => done(ctx.update_settings(patch).await),

        AppCommand::GetFlags => to_data(ctx.flags().await.config()),
        AppCommand::SetFlags { config } => done(ctx.flags().await.set_config(config)),
        AppCommand::SaveFlags => done(ctx.flags().await.save()),
        AppCommand::ResetFlags => done(ctx.flags().await.reset()),
        AppCommand::ValidateFlags { json } => ApiResponse::ok(json!(FlagStore::validate_json(&json))),
        AppCommand::ImportFlags { json } => done(ctx.flags().await.import_json(&json)),
        AppCommand::ExportFlags => match ctx.flags().await.export_json() {
            Ok(text) => ApiResponse::ok(Value::String(text)),
            Err(e) => e.into(),
        },

        AppCommand::ApplyPreset { id } => done(ctx.apply_preset(&id).await),
        AppCommand::ListPresets => to_data(ctx.presets().list()),

        AppCommand::UpdatePresence { presence } => {
            ctx.presence().update(&presence.with_default_images()).await;
            ApiResponse::ok_empty()
        }
        AppCommand::ClearPresence => {
            ctx.presence().clear().await;
            ApiResponse::ok_empty()
        }
        AppCommand::GetPresenceStatus => ApiResponse::ok(json!(ctx.presence().is_connected())),

        AppCommand::GetVersion => ApiResponse::ok(json!(VERSION)),
        AppCommand::OpenExternal { url } => match ctx.window().open_external(&url) {
            Ok(()) => ApiResponse::ok_empty(),
            Err(e) => ApiResponse::failed(format!("{:#}", e)),
        },

        AppCommand::MinimizeWindow => {
            ctx.window().minimize();
            ApiResponse::ok_empty()
        }
        AppCommand::MaximizeWindow => {
            ctx.window().maximize();
            ApiResponse::ok_empty()
        }
        AppCommand::CloseWindow => {
            let to_tray = ctx.settings().await.settings().general.close_to_tray;
            if to_tray {
                ctx.window().hide();
            } else {
                ctx.window().close();
            }
            ApiResponse::ok_empty()
        }
    }
}
