use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freakforge_motion::config::Config;
use freakforge_motion::physics::AnalysisSummary;
use freakforge_motion::session::SessionFile;

const CONFIG_PATH: &str = "config.toml";
const DEFAULT_DRILL: &str = "40 Yard Dash";

struct Args {
    session_path: String,
    drill: String,
    date: NaiveDate,
    config_path: String,
}

fn usage() -> &'static str {
    "Usage: freakforge-motion <session.json> [--drill NAME] [--date YYYY-MM-DD] [--config PATH]"
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut session_path = None;
    let mut drill = DEFAULT_DRILL.to_string();
    let mut date = Local::now().date_naive();
    let mut config_path = CONFIG_PATH.to_string();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--drill" => drill = args.next().context("--drill needs a value")?,
            "--date" => {
                let value = args.next().context("--date needs a value")?;
                date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .with_context(|| format!("invalid date: {}", value))?;
            }
            "--config" => config_path = args.next().context("--config needs a value")?,
            "-h" | "--help" => bail!(usage()),
            _ if session_path.is_none() && !arg.starts_with("--") => session_path = Some(arg),
            _ => bail!("unexpected argument: {}\n{}", arg, usage()),
        }
    }

    let Some(session_path) = session_path else {
        bail!(usage());
    };
    Ok(Args {
        session_path,
        drill,
        date,
        config_path,
    })
}

fn print_summary(summary: &AnalysisSummary) {
    println!("=== 解析結果 ===");
    println!(
        "  最高速度: {:.2} yd/s ({:.2} mph)",
        summary.max_velocity, summary.max_velocity_mph
    );
    println!(
        "  平均速度: {:.2} yd/s ({:.2} mph)",
        summary.avg_velocity, summary.avg_velocity_mph
    );
    println!(
        "  最大加速度: {:.2} yd/s² ({:.2} g), 最大|加速度|: {:.2} g",
        summary.peak_acceleration, summary.peak_acceleration_g, summary.max_acceleration_g
    );
    if let Some(power) = summary.max_power {
        println!("  最大パワー: {:.0} W", power);
    }
    println!(
        "  距離: {:.2} yd, 時間: {:.2} s",
        summary.total_distance, summary.total_time
    );
    for split in &summary.splits {
        match split.time {
            Some(t) => println!("  {} yd: {:.2} s ({:?})", split.distance, t, split.source),
            None => println!("  {} yd: -", split.distance),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freakforge_motion=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;
    let config = Config::load_or_default(&args.config_path);

    let session = SessionFile::load(&args.session_path)?;
    info!(
        frames = session.frames.len(),
        fps = session.fps,
        "loaded session {}",
        args.session_path
    );

    let Some(analysis) = session.analyze(&config.physics_options())? else {
        bail!("not enough tracked positions to compute physics");
    };

    print_summary(&analysis.summary);
    println!();

    let entry = analysis.performance_entry(args.date, args.drill);
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
