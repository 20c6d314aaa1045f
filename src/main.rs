use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use campus_router::store::NodeStore;
use campus_router::{
    geometry, store, BuildingRegistry, Coordinate, Destination, GeodesicGraphStrategy, GraphSlot,
    PersistedGraphStrategy, RouteManager, RoutingConfig,
};
use clap::Parser;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct LoadError(PathBuf, #[source] Box<dyn Error>);

#[derive(Parser)]
struct Cli {
    /// The path to the GeoJSON file with walking paths (optionally gzip or bzip2 compressed)
    geometry_file: PathBuf,

    /// Latitude of the user's position
    start_lat: f64,

    /// Longitude of the user's position
    start_lon: f64,

    /// Latitude of the destination
    end_lat: f64,

    /// Longitude of the destination
    end_lon: f64,

    /// JSON file with curated nodes and edges, searched if the path network has no route
    #[arg(long)]
    store: Option<PathBuf>,

    /// JSON file with routing thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only use features with this `type` property (may be repeated)
    #[arg(long = "feature-type")]
    feature_types: Vec<String>,

    /// Name of the building the destination belongs to
    #[arg(long)]
    building: Option<String>,

    /// The destination lies inside --building
    #[arg(long, requires = "building")]
    indoor: bool,

    /// Name of the destination, for display
    #[arg(long)]
    label: Option<String>,

    /// Merge vertices closer than this many meters
    #[arg(long)]
    merge_threshold: Option<f64>,

    /// Look for destination nodes within this many meters of --building first
    #[arg(long)]
    building_radius: Option<f64>,

    /// Maximum distance in meters to the closest curated node
    #[arg(long)]
    snap_radius: Option<f64>,

    /// Walking speed in meters per second, used for the ETA
    #[arg(long)]
    walking_speed: Option<f64>,

    /// Maximum number of nodes expanded by a single search
    #[arg(long)]
    step_limit: Option<usize>,

    /// Warn when merging more vertices than this
    #[arg(long)]
    merge_warning_vertices: Option<usize>,

    /// Base URL of an OSRM service used as the last resort
    #[cfg(feature = "osrm")]
    #[arg(long)]
    osrm: Option<String>,
}

impl Cli {
    fn routing_config(&self) -> Result<RoutingConfig, Box<dyn Error>> {
        let mut config = match self.config {
            Some(ref path) => RoutingConfig::from_file(path)
                .map_err(|e| LoadError(path.clone(), Box::new(e)))?,
            None => RoutingConfig::default(),
        };

        if let Some(v) = self.merge_threshold {
            config.merge_threshold_m = v;
        }
        if let Some(v) = self.building_radius {
            config.building_radius_m = v;
        }
        if let Some(v) = self.snap_radius {
            config.persisted_snap_radius_m = v;
        }
        if let Some(v) = self.walking_speed {
            config.walking_speed_mps = v;
        }
        if let Some(v) = self.step_limit {
            config.step_limit = v;
        }
        if let Some(v) = self.merge_warning_vertices {
            config.merge_warning_vertices = v;
        }

        config.validate()?;
        Ok(config)
    }

    fn destination(&self) -> Destination {
        let mut d = Destination::at(Coordinate::new(self.end_lat, self.end_lon));
        if let Some(ref label) = self.label {
            d = d.labeled(label.as_str());
        }
        if let Some(ref building) = self.building {
            d = d.in_building(building.as_str(), self.indoor);
        }
        d
    }
}

pub fn main() -> Result<ExitCode, Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();
    let config = cli.routing_config()?;

    let mut manager = RouteManager::new(config.clone());

    let options = geometry::Options {
        file_format: geometry::FileFormat::Unknown,
        feature_types: if cli.feature_types.is_empty() {
            None
        } else {
            Some(cli.feature_types.clone())
        },
    };
    let paths = GraphSlot::new();
    paths.reload(load_graph(&cli.geometry_file, &options, &config));
    manager.add_finder(GeodesicGraphStrategy::new(paths, &config));

    if let Some(ref path) = cli.store {
        let curated = GraphSlot::new();
        match load_store(path) {
            Ok(s) => {
                let nodes = s.list_nodes()?;
                manager.set_buildings(BuildingRegistry::from_records(&nodes));
                curated.reload::<store::Error>(store::load_graph(&s));
            }
            Err(e) => log::error!("{e}"),
        }
        manager.add_finder(PersistedGraphStrategy::new(curated, &config));
    }

    #[cfg(feature = "osrm")]
    if let Some(ref url) = cli.osrm {
        let router = campus_router::osrm::OsrmRouter::new(url.as_str())?;
        manager.add_finder(campus_router::ExternalServiceStrategy::new(router));
    }

    manager.set_user_location(Some(Coordinate::new(cli.start_lat, cli.start_lon)));

    match manager.create_route(&cli.destination()) {
        Ok(route) => {
            log::info!(
                "route via {}: {:.2} km, ETA {} min",
                route.finder,
                route.distance_km(),
                route.eta_minutes
            );
            let collection = geojson::FeatureCollection {
                bbox: None,
                features: vec![route.to_geojson()],
                foreign_members: None,
            };
            println!("{}", serde_json::to_string_pretty(&collection)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(reason) => {
            eprintln!("{reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    options: &geometry::Options,
    config: &RoutingConfig,
) -> Result<campus_router::Graph, LoadError> {
    geometry::graph_from_file(options, config, path.as_ref())
        .map_err(|e| LoadError(PathBuf::from(path.as_ref()), Box::new(e)))
}

fn load_store<P: AsRef<Path>>(path: P) -> Result<store::MemoryStore, LoadError> {
    store::MemoryStore::from_file(path.as_ref())
        .map_err(|e| LoadError(PathBuf::from(path.as_ref()), Box::new(e)))
}
