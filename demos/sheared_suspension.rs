use squeeze_film::*;

fn main() {
    let radius = 1e-3;
    let side = 5;
    let spacing = 2.0 * radius + 1e-6;
    let edge = side as f64 * spacing;
    let shear_rate = 10.0;
    let dt = 1e-5;

    let mut gradient = DMat3::ZERO;
    gradient.y_axis.x = shear_rate;
    let cell = PeriodicCell::cube(edge).with_velocity_gradient(gradient);
    let mut world = LubricationWorld::with_config(dt, LubricationConfig::default())
        .expect("valid config")
        .with_pair_builder(PairPhysicsBuilder::new(1e-3, 1e-3))
        .with_periodic_cell(cell);
    world.set_parallel_enabled(true);

    for i in 0..side {
        for j in 0..side {
            for k in 0..side {
                let position = DVec3::new(i as f64, j as f64, k as f64) * spacing;
                let velocity = DVec3::new(shear_rate * position.y, 0.0, 0.0);
                world.add_body(Body::sphere(radius, position).with_velocity(velocity, DVec3::ZERO));
            }
        }
    }

    for step in 0..200 {
        let report = world.step().expect("step");
        for (_, body) in world.bodies.iter_mut() {
            body.position += body.velocity.linear * dt;
        }
        if step % 40 == 0 {
            let stress = world.total_stresses().expect("periodic cell");
            println!(
                "step {step:>3}: {} pairs ({} flips), sigma_xy lubrication = {:.3e} Pa, contact = {:.3e} Pa",
                report.pairs_evaluated,
                report.regime_flips,
                stress.shear_lubrication.y_axis.x + stress.normal_lubrication.y_axis.x,
                stress.shear_contact.y_axis.x + stress.normal_contact.y_axis.x,
            );
        }
    }
}
