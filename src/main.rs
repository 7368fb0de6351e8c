use std::path::PathBuf;

use clap::{Parser, Subcommand};
use maud::{DOCTYPE, PreEscaped, html};
use serde_json::json;

use flatsite::builder::{BuildOptions, Builder};
use flatsite::config::SiteConfig;
use flatsite::output;
use flatsite::templates::Context;
use flatsite::values::{Value, ValueList, ValueSource, ValueSources};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "flatsite")]
#[command(about = "Flask-like static site generator")]
#[command(long_about = "\
Flask-like static site generator

flatsite is a library first: you register view functions against typed
route patterns in Rust code, then run one build pass. This binary ships
two conveniences around that workflow.

Route patterns:

  /data/<string:ship>/cruise/<int:cruise_id>/report.html

  string   any text without a slash
  int      integers
  float    floating point values
  path     like string but also accepts slashes (must exist on disk)

A placeholder's value domain is either a flat list (expanded as a
Cartesian product with its neighbors) or a keyed mapping chained on the
placeholder just before it (expanded per key).

Run 'flatsite gen-config' for a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct DemoArgs {
    /// Output directory
    #[arg(long, default_value = "build")]
    dest: PathBuf,

    /// Keep pre-existing files instead of overwriting them
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the bundled demonstration site
    Demo(DemoArgs),
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo(args) => {
            let site = demo_site()?;
            let opts = BuildOptions {
                dest: args.dest,
                overwrite: !args.no_overwrite,
                ..BuildOptions::default()
            };
            let report = site.build(&opts)?;
            output::print_build_output(&report);
        }
        Command::GenConfig => {
            print!("{}", SiteConfig::stock_toml());
        }
    }
    Ok(())
}

/// The demonstration site: one static page plus a chained two-ship cruise
/// hierarchy, rendered through a shared maud template.
fn demo_site() -> Result<Builder, Box<dyn std::error::Error>> {
    let ships = ["Oleander", "Bonnevie"];
    let cruises = [("Oleander", vec![1, 2]), ("Bonnevie", vec![99, 98, 97])];

    let mut site = Builder::new();
    site.set_meta("title", "flatsite demo");
    site.add_template("page.html", page_template);

    let link_data: Vec<(String, Vec<i64>)> = cruises
        .iter()
        .map(|(ship, ids)| (ship.to_string(), ids.clone()))
        .collect();
    site.register(
        "home",
        "/hello_world.html",
        ValueSources::new(),
        move |ctx, _vars| {
            let mut body = String::from("<h2>Hello World !</h2>");
            for (ship, ids) in &link_data {
                for id in ids {
                    let url = ctx.url_for(
                        "cruise_report",
                        &[Value::from(ship.as_str()), Value::from(*id)],
                    )?;
                    body.push_str(&format!(
                        "\n<br><a href='{url}'>{ship}: report for cruise {id}</a>"
                    ));
                }
            }
            let mut bindings = Context::new();
            bindings.insert("title".into(), json!("Hello World !"));
            bindings.insert("body".into(), json!(body));
            bindings.insert("stylesheet".into(), json!(ctx.static_url("stylesheet.css")));
            Ok(ctx.render("page.html", &bindings)?)
        },
    )?;

    site.register(
        "cruise_report",
        "/<string:ship>/cruise/<int:cruise_id>/",
        ValueSources::new()
            .with("ship", ValueList::strings(ships))
            .with(
                "cruise_id",
                ValueSource::keyed(
                    cruises
                        .iter()
                        .map(|(ship, ids)| (*ship, ValueList::ints(ids.iter().copied()))),
                ),
            ),
        |ctx, vars| {
            let (ship, cruise_id) = (&vars[0], &vars[1]);
            let home = ctx.url_for("home", &[])?;
            let body = format!(
                "<h2>This is cruise {cruise_id}. Hail to the {ship} !</h2>\
                 \n<br><a href='{home}'>home</a>"
            );
            let mut bindings = Context::new();
            bindings.insert("title".into(), json!(format!("{ship}: Cruise {cruise_id}")));
            bindings.insert("body".into(), json!(body));
            bindings.insert("stylesheet".into(), json!(ctx.static_url("stylesheet.css")));
            Ok(ctx.render("page.html", &bindings)?)
        },
    )?;

    Ok(site)
}

fn page_template(bindings: &Context) -> String {
    let text = |key: &str| {
        bindings
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (text("title")) }
                link rel="stylesheet" href=(text("stylesheet")) type="text/css";
            }
            body {
                (PreEscaped(text("body")))
                div id="footer" {
                    "Built with flatsite"
                }
            }
        }
    }
    .into_string()
}
