use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use viagem_brasil::{
    postal::format_cep,
    weather::weather_icon,
    App, AppConfig, Sourced,
};

#[derive(Parser, Debug)]
#[command(name = "viagem")]
#[command(about = "Travel data for Brazilian destinations")]
struct Args {
    // -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    // Persist the weather quota here (overrides VIAGEM_STATE_FILE)
    #[arg(long, global = true)]
    state_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current weather, or a daily forecast with --days
    Weather {
        city: String,
        #[arg(long)]
        days: Option<usize>,
    },
    /// National holidays for a year (defaults to the current one)
    Holidays { year: Option<i32> },
    /// Country metadata by name
    Country { name: String },
    /// All federative units
    States,
    /// Municipalities of a state
    Cities { uf: String },
    /// Major destinations of a state
    Destinations { uf: String },
    /// Address for a postal code
    Cep { code: String },
    /// Weather quota usage
    Quota,
}

fn init_logging(verbosity: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("viagem_brasil=warn"),
            1 => EnvFilter::new("viagem_brasil=info"),
            2 => EnvFilter::new("viagem_brasil=debug"),
            _ => EnvFilter::new("viagem_brasil=trace,reqwest=debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn origin<T>(sourced: &Sourced<T>) -> &'static str {
    if sourced.is_fallback() {
        " (offline data)"
    } else {
        ""
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = AppConfig::from_env().context("reading configuration")?;
    if let Some(path) = args.state_file {
        config.state_file = Some(path);
    }
    let app = App::from_config(config).context("building services")?;

    match args.command {
        Command::Weather { city, days: None } => {
            let report = app.weather.current(&city).await?;
            let r = report.value();
            println!(
                "{} {}{}: {:.1}°C (feels {:.1}°C), {}, humidity {:.0}%, wind {:.0} km/h",
                weather_icon(&r.icon),
                r.city,
                origin(&report),
                r.temp,
                r.feels_like,
                r.condition,
                r.humidity,
                r.wind_speed
            );
        }
        Command::Weather { city, days: Some(days) } => {
            let forecast = app.weather.forecast(&city, days).await?;
            println!("{}{}", city, origin(&forecast));
            for day in forecast.value() {
                println!(
                    "  {} {} {:.0}°C / {:.0}°C, rain {:.0}%, {}",
                    day.date,
                    weather_icon(&day.icon),
                    day.temp_max,
                    day.temp_min,
                    day.precip_probability,
                    day.condition
                );
            }
        }
        Command::Holidays { year } => {
            let year = year.unwrap_or_else(|| Local::now().year());
            let holidays = app.holidays.holidays(year).await?;
            println!("Holidays {}{}", year, origin(&holidays));
            for holiday in holidays.value() {
                println!("  {}  {} ({})", holiday.date, holiday.name, holiday.kind);
            }
        }
        Command::Country { name } => {
            let countries = app.countries.by_name(&name).await?;
            for country in countries.value() {
                println!("{} {}{}", country.flag, country.common_name, origin(&countries));
                println!("  official:   {}", country.official_name);
                println!("  capital:    {}", country.capital.join(", "));
                println!("  population: {}", country.population);
                let currencies: Vec<_> = country
                    .currencies
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.symbol))
                    .collect();
                println!("  currencies: {}", currencies.join(", "));
                println!("  borders:    {}", country.borders.join(", "));
            }
        }
        Command::States => {
            let states = app.localities.states().await?;
            println!("States{}", origin(&states));
            for state in states.value() {
                println!("  {}  {} ({})", state.code, state.name, state.region);
            }
        }
        Command::Cities { uf } => {
            let cities = app.localities.municipalities(&uf).await?;
            println!("{} municipalities{}", cities.value().len(), origin(&cities));
            for city in cities.value() {
                println!("  {}", city.name);
            }
        }
        Command::Destinations { uf } => {
            let destinations = app.destinations.major_destinations(&uf).await?;
            println!("Destinations{}", origin(&destinations));
            for destination in destinations.value() {
                match destination.point {
                    Some(p) => println!("  {} [{:.4}, {:.4}]", destination.name, p.lat, p.lon),
                    None => println!("  {}", destination.name),
                }
                println!("    {}", destination.description);
            }
        }
        Command::Cep { code } => {
            let address = app.postal.lookup(&code).await?;
            println!(
                "{}: {}, {} - {}",
                format_cep(&address.cep),
                address.street.as_deref().unwrap_or("-"),
                address.city,
                address.state
            );
            if let Some(neighborhood) = address.neighborhood.as_deref() {
                println!("  {}", neighborhood);
            }
        }
        Command::Quota => {
            let status = app.weather.quota_status();
            println!(
                "used {}/{} today, {} active, {} queued, {}",
                status.used,
                status.limit,
                status.active,
                status.queued,
                if status.can_submit { "accepting requests" } else { "exhausted" }
            );
        }
    }

    Ok(())
}
