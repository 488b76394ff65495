use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use fireground_core::core_types::units::{Celsius, Degrees, Meters, MetersPerSecond, Percent};
use fireground_core::persistence::save_field;
use fireground_core::{
    AnalysisConfig, AnalysisOutcome, Collaborators, FireBehavior, FireBehaviorPair,
    FireBehaviorProvider, Fireground, FiregroundError, FiregroundEvent, FuelCondition, FuelModel,
    FuelModelProvider, FuelMoistureScenario, GeneralWeather, GeoPoint, ProviderError, Sector,
    Terrain, TerrainProvider, TimeSeries, Weather, Wind,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Fireground analysis demo with synthetic terrain, fuels and fire behavior
#[derive(Parser, Debug)]
#[command(name = "fireground-demo")]
#[command(about = "Hourly fire environment over a sector", long_about = None)]
struct Args {
    /// Southern bound (degrees)
    #[arg(long, default_value_t = 34.20, allow_hyphen_values = true)]
    south: f64,

    /// Western bound (degrees)
    #[arg(long, default_value_t = -119.30, allow_hyphen_values = true)]
    west: f64,

    /// Northern bound (degrees)
    #[arg(long, default_value_t = 34.30, allow_hyphen_values = true)]
    north: f64,

    /// Eastern bound (degrees)
    #[arg(long, default_value_t = -119.20, allow_hyphen_values = true)]
    east: f64,

    /// Grid cell size in degrees (overrides the config file)
    #[arg(short, long)]
    resolution: Option<f64>,

    /// Number of daily cycles (overrides the config file)
    #[arg(long)]
    cycles: Option<usize>,

    /// Analysis date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-07-15")]
    date: NaiveDate,

    /// Air temperature in °C
    #[arg(short, long, default_value_t = 32.0)]
    temperature: f64,

    /// Relative humidity in %
    #[arg(long, default_value_t = 15.0)]
    humidity: f64,

    /// Wind speed in km/h
    #[arg(short, long, default_value_t = 20.0)]
    wind_speed: f64,

    /// Wind direction in degrees (direction the wind blows from)
    #[arg(long, default_value_t = 270.0)]
    wind_direction: f64,

    /// Cloud cover in %
    #[arg(long, default_value_t = 0.0)]
    cloud_cover: f64,

    /// Fuel model code for the whole sector (1-13)
    #[arg(short, long, default_value_t = 1)]
    fuel: i32,

    /// Analysis configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the fire behavior field to this file (JSON)
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Report interval in hours
    #[arg(long, default_value_t = 3)]
    report_interval: usize,
}

/// A single hill centred on the sector
struct HillTerrain {
    center: GeoPoint,
    base: f64,
    height: f64,
    radius_deg: f64,
}

impl TerrainProvider for HillTerrain {
    fn terrain_at(&self, point: GeoPoint) -> Result<Terrain, ProviderError> {
        let dy = point.latitude - self.center.latitude;
        let dx = point.longitude - self.center.longitude;
        let r = (dx * dx + dy * dy).sqrt() / self.radius_deg;
        let elevation = self.base + self.height * (-r * r).exp();
        // dz/dr of the gaussian, converted to a slope angle with ~100 km per degree
        let run_m = self.radius_deg * 100_000.0;
        let grade = 2.0 * r * self.height * (-r * r).exp() / run_m;
        let aspect = dx.atan2(dy).to_degrees().rem_euclid(360.0);
        Ok(Terrain::new(
            Degrees::new(grade.atan().to_degrees()),
            Degrees::new(aspect),
            Meters::new(elevation),
        ))
    }
}

struct UniformFuel(i32);

impl FuelModelProvider for UniformFuel {
    fn fuel_model_at(&self, _point: GeoPoint) -> Result<i32, ProviderError> {
        Ok(self.0)
    }
}

/// Rough spread estimate, driven by fuel depth, dead fuel moisture and wind
struct IndicativeBehavior;

impl IndicativeBehavior {
    fn estimate(
        fuel_model: &FuelModel,
        condition: &FuelCondition,
        wind: f64,
        wind_dir: f64,
    ) -> FireBehavior {
        let moisture = *condition.fuel_moisture.dead_1h;
        let damping = (1.0 - moisture / 30.0).clamp(0.0, 1.0);
        let base = 0.01 * *fuel_model.fuel_bed_depth * damping;
        let rate_of_spread = base * (1.0 + 0.3 * wind);
        let heat_release = 8000.0 * *fuel_model.fuel_bed_depth * damping;
        let intensity = heat_release * rate_of_spread;
        let flame_length = 0.0775 * intensity.max(0.0).powf(0.46);
        FireBehavior::new(
            intensity,
            flame_length,
            rate_of_spread,
            (wind_dir + 180.0).rem_euclid(360.0),
            heat_release,
        )
    }
}

impl FireBehaviorProvider for IndicativeBehavior {
    fn compute_fire_behavior(
        &self,
        fuel_model: &FuelModel,
        condition: &FuelCondition,
        weather: &Weather,
        terrain: &Terrain,
    ) -> Result<FireBehaviorPair, ProviderError> {
        if !terrain.is_valid() {
            return Err(ProviderError::NoData);
        }
        Ok(FireBehaviorPair {
            with_wind: Self::estimate(
                fuel_model,
                condition,
                *weather.wind_speed,
                *weather.wind_direction,
            ),
            no_wind: Self::estimate(fuel_model, condition, 0.0, *terrain.aspect + 180.0),
        })
    }
}

fn general_weather(
    args: &Args,
    times: &[NaiveDateTime],
) -> Result<GeneralWeather, FiregroundError> {
    // Simple diurnal swing around the given values, warmest at 15:00
    let swing = |t: &NaiveDateTime| {
        let hour = f64::from(chrono::Timelike::hour(t));
        ((hour - 15.0) / 24.0 * std::f64::consts::TAU).cos()
    };
    let temps = times
        .iter()
        .map(|t| Celsius::new(args.temperature - 6.0 + 6.0 * swing(t)))
        .collect();
    let humidities = times
        .iter()
        .map(|t| Percent::new((args.humidity + 15.0 - 15.0 * swing(t)).clamp(1.0, 100.0)))
        .collect();
    let wind = Wind::new(
        MetersPerSecond::new(args.wind_speed / 3.6),
        Degrees::new(args.wind_direction),
    );
    Ok(GeneralWeather {
        air_temperatures: Some(TimeSeries::new(times.to_vec(), temps)?),
        relative_humidities: Some(TimeSeries::new(times.to_vec(), humidities)?),
        winds: Some(TimeSeries::constant(times.to_vec(), wind)?),
        cloud_cover: Some(TimeSeries::constant(
            times.to_vec(),
            Percent::new(args.cloud_cover),
        )?),
    })
}

fn load_config(args: &Args) -> Result<AnalysisConfig, FiregroundError> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig {
            resolution_degrees: 0.005,
            moisture_scenario: FuelMoistureScenario::VeryLowDeadFullyCuredHerb,
            ..AnalysisConfig::default()
        },
    };
    if let Some(resolution) = args.resolution {
        config.resolution_degrees = resolution;
    }
    if let Some(cycles) = args.cycles {
        config.num_cycles = cycles;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<(), FiregroundError> {
    let config = load_config(args)?;
    let sector = Sector::new(args.south, args.west, args.north, args.east);
    println!("=== Fireground Analysis Demo ===\n");
    println!("Sector: {}", sector);
    println!(
        "Resolution: {}°, {} daily cycles from {:02}:00",
        config.resolution_degrees, config.num_cycles, config.daily_cycle_start_hour
    );

    let terrain = HillTerrain {
        center: sector.center(),
        base: 300.0,
        height: 400.0,
        radius_deg: sector.width().min(sector.height()) / 3.0,
    };
    let collaborators = Collaborators::default()
        .with_terrain(Arc::new(terrain))
        .with_fire_behavior(Arc::new(IndicativeBehavior));
    let fireground = Fireground::new(config, collaborators)?;

    let start = args.date.and_hms_opt(0, 0, 0).unwrap_or_default();
    fireground.set_start_time(start)?;
    fireground.add_sector(sector, Arc::new(UniformFuel(args.fuel)))?;
    let times = fireground.time_grid()?.unwrap_or_default();
    fireground.add_weather(general_weather(args, &times)?)?;

    let events = fireground.subscribe();
    let progress = thread::spawn(move || {
        for event in events {
            match event {
                FiregroundEvent::StageStarted(stage) => println!("  running {} ...", stage),
                FiregroundEvent::StageCompleted(stage) => println!("  {} done", stage),
                FiregroundEvent::AnalysisFinished(_) => break,
                _ => {}
            }
        }
    });

    println!("\nStarting analysis...");
    let handle = fireground.start_analysis()?;
    let outcome = handle.join();
    let _ = progress.join();
    match &outcome {
        AnalysisOutcome::Completed => println!("Analysis complete\n"),
        other => {
            error!("Analysis did not complete: {:?}", other);
            return Ok(());
        }
    }

    let center = sector.center();
    println!("Hourly fire environment at {}:", center);
    println!(
        "{:<18} {:>7} {:>7} {:>7} {:>9} {:>9} {:>8}",
        "time", "air °C", "fuel °C", "1h %", "ROS m/s", "kW/m", "flame m"
    );
    let step = args.report_interval.max(1);
    for time in times.iter().step_by(step) {
        match fireground.fire_environment(*time, center)? {
            Some(env) => println!(
                "{:<18} {:>7.1} {:>7.1} {:>7.2} {:>9.3} {:>9.0} {:>8.2}",
                time.format("%Y-%m-%d %H:%M"),
                *env.condition.air_temperature,
                *env.condition.fuel_temperature,
                *env.condition.fuel_moisture.dead_1h,
                *env.behavior_max.rate_of_spread,
                env.behavior_max.fireline_intensity,
                *env.behavior_max.flame_length,
            ),
            None => println!("{:<18} (no data)", time.format("%Y-%m-%d %H:%M")),
        }
    }

    if let Some(path) = &args.save {
        if let Some((_, model)) = fireground.fire_behaviors()?.into_iter().next() {
            save_field(path, "fire behavior", model.data()?.as_ref())?;
            info!("Fire behavior saved to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fireground_core=info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
