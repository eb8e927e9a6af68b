//! # HomeFrame site server
//!
//! Routing and content server for the HomeFrame marketing site. Every
//! page is answered as a JSON view model for the presentation layer.
//!
//! ## Features
//!
//! - **Country routing**: pages live under `/us`, `/uk`, `/au` and `/ca`.
//!   Requests without a valid prefix are redirected using the visitor's
//!   stored preference, their geo country or the default locale.
//!
//! - **CMS content**: the blog and the help center are read from a
//!   headless WordPress CMS, normalized, cached and paginated. A slow or
//!   failing CMS degrades to empty listings instead of errors.
//!
//! - **Site map and API docs**: `/sitemap.xml` and
//!   `/api-docs/openapi.json`.
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default: http://0.0.0.0:8080)
//! homeframe serve
//!
//! # Write the site map to a file
//! homeframe sitemap --output public/sitemap.xml
//!
//! # Print every localized route
//! homeframe routes
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                      |
//! |--------|-------------------------------|----------------------------------|
//! | GET    | `/{locale}/{route}`           | Localized static page            |
//! | GET    | `/blog`                       | Blog index (`?page=`)            |
//! | GET    | `/blog/search`                | Blog search (`?q=&page=`)        |
//! | GET    | `/blog/category/{slug}`       | Posts in a category              |
//! | GET    | `/blog/tag/{slug}`            | Posts with a tag                 |
//! | GET    | `/blog/{slug}`                | A single post                    |
//! | GET    | `/help-center/...`            | Same shape as the blog           |
//! | POST   | `/api/locale`                 | Switch locale                    |
//! | GET    | `/api/health`                 | Liveness probe                   |
//! | GET    | `/sitemap.xml`                | XML site map                     |
//! | GET    | `/api-docs/openapi.json`      | OpenAPI document                 |

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod api;
pub mod config;
pub mod content;
pub mod context;
pub mod locale;
pub mod pages;
pub mod resolver;
pub mod sitemap;
pub mod views;

#[cfg(test)]
mod test_utils;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::api::AppState;
use crate::config::{SiteArgs, SiteConfig};

/// HomeFrame: localized marketing pages and CMS content.
#[derive(Parser, Debug)]
#[command(name = "homeframe")]
#[command(about = "Locale-aware routing and content server for the HomeFrame site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value_t = 8080)]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[command(flatten)]
        site: SiteArgs,
    },

    /// Generate the XML site map from the live CMS.
    Sitemap {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        site: SiteArgs,
    },

    /// Print every localized route and content section.
    Routes {
        #[command(flatten)]
        site: SiteArgs,
    },
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, site } => {
            let config = load_config(&site)?;
            run_server(&host, port, config).await
        }
        Commands::Sitemap { output, site } => {
            let config = load_config(&site)?;
            sitemap::run_sitemap(&config, output.as_deref())
                .await
                .map_err(std::io::Error::other)
        }
        Commands::Routes { site } => {
            let config = load_config(&site)?;
            pages::print_routes(&config);
            Ok(())
        }
    }
}

fn load_config(args: &SiteArgs) -> std::io::Result<SiteConfig> {
    SiteConfig::from_args(args).map_err(|e| {
        let message = t!("cli.config_invalid", error = &e).to_string();
        log::error!("{}", message);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
    })
}

/// Starts the HTTP server with the locale resolver in front of every route.
async fn run_server(host: &str, port: u16, config: SiteConfig) -> std::io::Result<()> {
    let config = Arc::new(config);
    let state = AppState::from_config(Arc::clone(&config)).map_err(std::io::Error::other)?;
    let state = web::Data::new(state);
    let config_data = web::Data::from(Arc::clone(&config));

    let locales: Vec<&str> = config.locales.supported().iter().map(|l| l.as_str()).collect();
    log::info!("Starting HomeFrame site server on {}:{}", host, port);
    log::info!(
        "Locales: {} (default {})",
        locales.join(", "),
        config.locales.default_locale()
    );
    log::info!("Blog CMS: {}", config.blog.api_base);
    log::info!("Help-center CMS: {}", config.help_center.api_base);
    log::info!("OpenAPI document at http://{}:{}/api-docs/openapi.json", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::from_fn(resolver::locale_gate))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(config_data.clone())
            .app_data(state.clone())
            .configure(api::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
