use argh::FromArgs;
use std::path::{Path, PathBuf};

use armsight::camera::{DepthImage, ImageSize, PinholeUnprojector};
use armsight::kinematics::{
    IkConfig, IkSolution, InverseSolver, KinematicsError, RigidTransform, HOME_CONFIGURATION,
};

#[derive(FromArgs)]
/// Unproject a depth pixel and solve for a Franka Panda grasp over it
struct Args {
    /// vertical field of view of the camera in degrees
    #[argh(option, default = "60.0")]
    fov: f64,

    /// image width in pixels
    #[argh(option, default = "640")]
    width: usize,

    /// image height in pixels
    #[argh(option, default = "480")]
    height: usize,

    /// pixel column, defaults to the image center
    #[argh(option)]
    u: Option<usize>,

    /// pixel row, defaults to the image center
    #[argh(option)]
    v: Option<usize>,

    /// depth reading at the pixel in meters
    #[argh(option, default = "0.6")]
    depth: f64,

    /// camera height above the robot base in meters
    #[argh(option, default = "1.0")]
    camera_height: f64,

    /// path to a JSON file with the inverse kinematics settings
    #[argh(option)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<IkConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(IkConfig::default());
    };
    let file = std::fs::File::open(path)?;
    let config = serde_json::from_reader(std::io::BufReader::new(file))?;
    log::info!("Loaded IK settings from {}", path.display());
    Ok(config)
}

/// Solve for the gripper over `point_in_base`, keeping its home orientation.
fn solve_grasp(
    solver: &InverseSolver,
    point_in_base: [f64; 3],
) -> Result<IkSolution, KinematicsError> {
    let chain = solver.chain();
    let home_tool = chain.forward_kinematics_tool(&HOME_CONFIGURATION)?;
    let tool_target = RigidTransform::from_parts(&home_tool.rotation_part(), point_in_base);
    let target = tool_target * chain.tool_offset().inverse();

    solver
        .solve_detailed(&target, &HOME_CONFIGURATION)
        .inspect_err(|e| log::error!("No grasp configuration found: {e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = load_config(args.config.as_deref())?;

    let size = ImageSize {
        width: args.width,
        height: args.height,
    };
    let unprojector = PinholeUnprojector::new(args.fov, size)?;
    let intrinsics = unprojector.intrinsics();
    println!("Camera intrinsics: {:?}", intrinsics);

    // a flat frame is enough to read a single pixel
    let depth = DepthImage::from_size_val(size, args.depth)?;
    let u = args.u.unwrap_or(args.width / 2);
    let v = args.v.unwrap_or(args.height / 2);
    let point_in_camera = unprojector.unproject(&depth, u, v)?;
    println!("Pixel ({u}, {v}) -> camera point {:?}", point_in_camera);

    // camera above the base looking straight down
    let camera_in_base = RigidTransform::from_parts(
        &[[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]],
        [0.5, 0.0, args.camera_height],
    );
    let point_in_base = camera_in_base.transform_point(point_in_camera);
    println!("Grasp point in base frame: {:?}", point_in_base);

    let solver = InverseSolver::franka_panda().with_config(config);
    let solution = solve_grasp(&solver, point_in_base)?;
    println!("Joint angles: {:?}", solution.joints);
    println!(
        "Residual: {:.3e} after {} iterations",
        solution.residual, solution.iterations
    );
    let reached = solver.chain().forward_kinematics_tool(&solution.joints)?;
    println!("Tool position: {:?}", reached.translation_part());

    Ok(())
}
