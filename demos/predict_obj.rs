//! Predicts a skeleton for an OBJ file and prints the named joints.
//!
//! Run with: cargo run --example predict_obj -- <mesh.obj> [checkpoint.json]

use instarig::*;

fn main() -> Result<()> {
    init();

    let mut args = std::env::args().skip(1);
    let Some(obj_path) = args.next() else {
        eprintln!("usage: predict_obj <mesh.obj> [checkpoint.json]");
        std::process::exit(2);
    };

    let params = match args.next() {
        Some(checkpoint) => ModelParams::load(NetworkConfig::default(), checkpoint)?,
        None => {
            log::warn!("no checkpoint given, using untrained parameters");
            ModelParams::init(NetworkConfig::default(), 0)?
        }
    };

    let mut options = RigOptions::default();
    options.preprocess.normalize = true;
    let mut context = Context::with_options(options)?;
    let mesh = context.register_mesh("input", load_obj(&obj_path)?)?;

    let skeleton = context.generate_skeleton(&mesh, &params, SymmetryAxis::None, DetailLevel::Medium)?;
    println!("{} joints for {obj_path}", skeleton.joints.len());
    for diagnostic in &skeleton.diagnostics {
        println!("warning: {diagnostic:?}");
    }
    for joint in &skeleton.joints {
        println!(
            "{:>10}  ({:8.4}, {:8.4}, {:8.4})  weight {:.3}",
            joint.name, joint.position.x, joint.position.y, joint.position.z, joint.weight
        );
    }
    Ok(())
}
