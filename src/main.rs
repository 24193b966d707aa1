use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

mod app;
mod config;
mod logging;

mod domain {
    pub mod entities {
        pub mod client;
        pub mod driver;
        pub mod query;
        pub mod shipment;
    }
}

mod infra {
    pub mod import {
        pub mod csv;
    }
    pub mod sqlite {
        pub mod queries;
        pub mod records;
        pub mod schema;
        pub mod seed;
        pub mod source;
    }
}

mod platform {
    pub mod desktop {
        pub mod blocking;
    }
}

mod ui {
    pub mod format;
    pub mod state {
        pub mod app_state;
    }
}

mod usecase {
    pub mod aggregate;
    pub mod filter;
    pub mod pagination;
    pub mod sort;
    pub mod ports {
        pub mod feedback;
        pub mod source;
    }
    pub mod services {
        pub mod feedback;
        pub mod list_query;
        pub mod shipment_service;
    }
}

#[cfg(test)]
mod tests;

use crate::config::{project_dirs, AppConfig};
use crate::infra::sqlite::schema::init_db;
use crate::infra::sqlite::seed::seed_demo_data;

fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    logging::init(&config.log_level, config.log_format).context("failed to initialize logging")?;

    init_db(&config.db_path)?;
    if seed_demo_data(&config.db_path, chrono::Utc::now().timestamp())? {
        info!(db = %config.db_path.display(), "seeded demo data");
    }

    let webview_data_dir = default_webview_data_dir()?;
    info!(
        db = %config.db_path.display(),
        page_size = config.page_size,
        "starting fleetdesk"
    );

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("FleetDesk"))
                .with_data_directory(webview_data_dir),
        )
        .with_context(config)
        .launch(app::App);

    Ok(())
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = project_dirs()?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}
