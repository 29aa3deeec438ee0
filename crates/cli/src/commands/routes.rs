use std::path::Path;

use clap::Args;
use console::style;
use hookgen_core::generate_from_source;
use hookgen_core::route::{HttpMethod, OperationKind, Route};
use serde::Serialize;

use super::{SourceArgs, current_dir, report_failures, run_cli_async};

#[derive(Args, Debug, Clone)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, help = "Print the routes as a JSON array")]
    pub json: bool,
}

/// One listed route.
#[derive(Debug, Serialize)]
struct RouteRow<'a> {
    method: HttpMethod,
    path: &'a str,
    name: &'a str,
    key: String,
    kind: OperationKind,
}

impl<'a> RouteRow<'a> {
    fn new(route: &'a Route) -> Self {
        Self {
            method: route.method,
            path: &route.path,
            name: &route.name,
            key: route.colon_template(),
            kind: route.kind(),
        }
    }
}

pub async fn run(args: RoutesArgs) -> i32 {
    run_cli_async(move || async move {
        let cwd = current_dir()?;
        let listing = run_inner(&args, &cwd).await?;
        print!("{listing}");
        Ok(())
    })
    .await
}

async fn run_inner(args: &RoutesArgs, cwd: &Path) -> Result<String, String> {
    let resolved = args.source.resolve(cwd)?;
    let generated = generate_from_source(&resolved.source, &resolved.config.emit)
        .await
        .map_err(|err| err.to_string())?;
    report_failures(generated.failures());

    let rows: Vec<RouteRow<'_>> = generated.model.routes.iter().map(RouteRow::new).collect();
    if args.json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|err| format!("Failed to serialize routes: {err}"))?;
        return Ok(format!("{json}\n"));
    }
    Ok(render_table(&rows))
}

fn render_table(rows: &[RouteRow<'_>]) -> String {
    let path_width = rows.iter().map(|row| row.path.len()).max().unwrap_or(0);
    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);

    let mut output = String::new();
    for row in rows {
        let kind = match row.kind {
            OperationKind::Query => style("query   ").cyan(),
            OperationKind::Mutation => style("mutation").magenta(),
        };
        output.push_str(&format!(
            "{} {:<path_width$}  {:<name_width$}  {}  {}\n",
            style(format!("{:<7}", row.method.as_str())).bold(),
            row.path,
            row.name,
            kind,
            style(&row.key).dim(),
        ));
    }
    output
}
