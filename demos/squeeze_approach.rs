use squeeze_film::*;

fn main() {
    let radius = 1e-3;
    let speed = 1e-4;
    let dt = 1e-3;
    let config = LubricationConfig::default().with_cutoff_factor(3.0);
    let mut world = LubricationWorld::with_config(dt, config)
        .expect("valid config")
        .with_pair_builder(PairPhysicsBuilder::new(1e-3, 1e-3));

    let fixed = world.add_body(Body::sphere(radius, DVec3::ZERO));
    let moving = world.add_body(
        Body::sphere(radius, DVec3::new(2.0 * radius + 2e-3, 0.0, 0.0))
            .with_velocity(DVec3::new(-speed, 0.0, 0.0), DVec3::ZERO),
    );

    for step in 0..20_100 {
        world.step().expect("step");
        if let Some(interaction) = world.interaction_between(fixed, moving) {
            if step % 2_000 == 0 || interaction.state.contact && step % 20 == 0 {
                let state = &interaction.state;
                println!(
                    "step {step:>5}: gap u = {:.3e} m, force = {:.3e} N (contact {:.3e} N), contact = {}",
                    state.u,
                    state.normal_force.length(),
                    state.normal_contact_force.length(),
                    state.contact
                );
            }
        }
        if let Some(body) = world.body_mut(moving) {
            body.position.x -= speed * dt;
        }
    }
}
