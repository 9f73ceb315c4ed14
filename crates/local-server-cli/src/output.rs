//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use local_server_common::constants::DB_CREDENTIAL;
use local_server_compose::EnvironmentDocument;

use crate::compose::Project;

/// Reports a successful start or restart.
pub fn started(project: &Project) {
    tracing::info!("startup completed");
    println!("To access your site visit: {}", project.site_url());
}

/// Renders the services in startup order with their image and dependencies.
pub fn plan(project: &Project, document: &EnvironmentDocument, order: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Environment for: {}", project.config.hostname);
    let _ = writeln!(out, "{}", "\u{2550}".repeat(40));
    for name in order {
        let Some(service) = document.service(name) else {
            continue;
        };
        let _ = writeln!(out, "  + {name}");
        let _ = writeln!(out, "      image: {}", service.image);
        if !service.depends_on.is_empty() {
            let deps: Vec<String> = service
                .depends_on
                .iter()
                .map(|(dep, d)| format!("{dep} ({})", d.condition))
                .collect();
            let _ = writeln!(out, "      after: {}", deps.join(", "));
        }
    }
    let _ = write!(out, "\n  {} service(s).", order.len());
    out
}

/// Renders the database connection details.
///
/// `published` is the output of `docker compose port db 3306`; the container
/// port is shown when it is unknown.
pub fn db_info(project: &Project, published: Option<&str>) -> String {
    let host = "127.0.0.1";
    let port = published
        .and_then(|p| p.trim().rsplit_once(':'))
        .map_or("3306", |(_, port)| port);
    let major = project
        .config
        .mysql_version
        .split('.')
        .next()
        .unwrap_or_default();
    format!(
        "Root password:  {DB_CREDENTIAL}\n\n\
         Database:       {DB_CREDENTIAL}\n\
         User:           {DB_CREDENTIAL}\n\
         Password:       {DB_CREDENTIAL}\n\n\
         Host:           {host}\n\
         Port:           {port}\n\n\
         Version:        {major}\n\
         MySQL link:     mysql://{DB_CREDENTIAL}:{DB_CREDENTIAL}@{host}:{port}/{DB_CREDENTIAL}\n"
    )
}
