use clap::{Parser, Subcommand};
use uuid::Uuid;

use voxelkv::{
    CodecId, Data, DatasetId, Datatype, Engine, EngineError, InMemoryStore, Point3, Region, Result,
    Shape, VersionId,
};

#[derive(Parser)]
#[command(name = "voxelkv", version = "0.1.0", about = "Versioned voxel block store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Operate on one dataset instance ("node")
    Node {
        dataset: Uuid,
        data: String,
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(Subcommand)]
enum NodeAction {
    /// Load a stack of pre-decoded plane buffers into the store
    Load {
        #[command(subcommand)]
        source: LoadSource,
    },
}

#[derive(Subcommand)]
enum LoadSource {
    /// Read matching files from the local filesystem
    Local {
        /// xy, xz, or yz
        plane: String,
        /// "x,y,z" starting voxel offset of the first image
        offset: String,
        /// Glob pattern matching raw pre-decoded plane files, loaded in
        /// sorted-path order
        image_glob: String,
    },
    /// Reserved for a remote image source; not implemented
    Remote {
        plane: String,
        offset: String,
        image_glob: String,
    },
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let Cli { command } = Cli::parse();
    match command {
        Commands::Node { dataset, data, action } => match action {
            NodeAction::Load { source } => match source {
                LoadSource::Local { plane, offset, image_glob } => {
                    load_local(dataset, &data, &plane, &offset, &image_glob)?
                }
                LoadSource::Remote { .. } => {
                    return Err(Box::new(EngineError::Unsupported("load remote".into())))
                }
            },
        },
    }
    Ok(())
}

fn parse_plane(s: &str) -> Result<Shape> {
    match s {
        "xy" => Ok(Shape::Xy),
        "xz" => Ok(Shape::Xz),
        "yz" => Ok(Shape::Yz),
        other => Err(EngineError::BadRequest(format!("unknown plane '{other}', expected xy/xz/yz"))),
    }
}

fn parse_offset(s: &str) -> Result<Point3> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(EngineError::BadRequest(format!("offset '{s}' must be 'x,y,z'")));
    }
    let parse_i64 = |p: &str| {
        p.trim()
            .parse::<i64>()
            .map_err(|_| EngineError::BadRequest(format!("offset component '{p}' is not an integer")))
    };
    Ok(Point3::new(parse_i64(parts[0])?, parse_i64(parts[1])?, parse_i64(parts[2])?))
}

/// One (0,0,1) step along the plane's perpendicular axis, applied per image
/// in the stack.
fn step_for(plane: Shape) -> Point3 {
    match plane {
        Shape::Xy => Point3::new(0, 0, 1),
        Shape::Xz => Point3::new(0, 1, 0),
        Shape::Yz => Point3::new(1, 0, 0),
        _ => Point3::ZERO,
    }
}

fn load_local(dataset_uuid: Uuid, data_name: &str, plane: &str, offset: &str, image_glob: &str) -> Result<()> {
    let shape = parse_plane(plane)?;
    let start = parse_offset(offset)?;

    let datatype = Datatype::new(0, 1, 1)?;
    let data = Data::new(data_name, datatype.id);
    let dataset = DatasetId(dataset_uuid);
    let version = VersionId(Uuid::nil());

    // Not real PNG/JPEG decode (out of scope); each matched file is read as
    // raw bytes already shaped to the dataset's configured block geometry.
    let (width, height) = match shape {
        Shape::Xy => (data.block_size.x, data.block_size.y),
        Shape::Xz => (data.block_size.x, data.block_size.z),
        Shape::Yz => (data.block_size.y, data.block_size.z),
        _ => return Err(EngineError::Unsupported(format!("{shape:?} is not a loadable plane"))),
    };
    let stride = width * datatype.voxel_bytes() as i64;

    let mut paths: Vec<_> = glob::glob(image_glob)
        .map_err(|e| EngineError::BadRequest(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    let engine = Engine::new(InMemoryStore::new(), 4);
    let step = step_for(shape);
    let mut cursor = start;
    let mut loaded = 0usize;

    for path in &paths {
        let bytes = std::fs::read(path)?;
        let region = Region::new_slice(shape, cursor, width, height, stride);
        engine.put_region(&dataset, &data, &datatype, &version, &region, &bytes, CodecId::default())?;
        log::info!("loaded {} at offset {:?}", path.display(), cursor);
        cursor = cursor.add(step);
        loaded += 1;
    }

    println!("Loaded {loaded} image(s) into dataset '{data_name}' ({dataset_uuid})");
    Ok(())
}
