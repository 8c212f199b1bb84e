use approx::assert_relative_eq;
use squeeze_film::*;

const RADIUS: f64 = 1e-3;

fn world(dt: f64) -> LubricationWorld {
    LubricationWorld::with_config(dt, LubricationConfig::default().with_cutoff_factor(2.0))
        .expect("valid config")
        .with_pair_builder(PairPhysicsBuilder::new(1e-3, 1e-3))
}

/// Small cluster of spheres with mixed gaps, sliding and spinning.
fn cluster(world: &mut LubricationWorld) -> Vec<BodyId> {
    let mut ids = Vec::new();
    for i in 0..4 {
        for j in 0..3 {
            let index = (i * 3 + j) as f64;
            let gap = if (i + j) % 2 == 0 { 5e-7 } else { 3e-6 };
            let position = DVec3::new(
                i as f64 * (2.0 * RADIUS + gap),
                j as f64 * (2.0 * RADIUS + 1e-5),
                0.0,
            );
            let velocity = DVec3::new(index.sin(), (1.3 * index).cos(), (0.7 * index).sin()) * 1e-3;
            let spin = DVec3::new((0.3 * index).cos(), index.sin(), 1.0) * 2.0;
            ids.push(world.add_body(Body::sphere(RADIUS, position).with_velocity(velocity, spin)));
        }
    }
    ids
}

fn advance(world: &mut LubricationWorld) {
    let dt = world.time_step;
    for (_, body) in world.bodies.iter_mut() {
        body.position += body.velocity.linear * dt;
    }
}

#[test]
fn every_pair_obeys_newtons_third_law() {
    let mut world = world(1e-4);
    cluster(&mut world);

    for _ in 0..50 {
        world.step().expect("step");
        let net = world.forces().net_force();
        let scale: f64 = world
            .bodies
            .ids()
            .map(|id| world.force(id).length())
            .fold(0.0, f64::max);
        assert!(scale > 0.0);
        assert!(net.length() <= 1e-12 * scale, "net force {net:?}");

        for interaction in world.interactions().values() {
            let state = &interaction.state;
            let total = state.normal_contact_force + state.normal_lubrication_force;
            let magnitude = state
                .normal_force
                .length()
                .max(state.normal_contact_force.length());
            assert!((state.normal_force - total).length() <= 1e-12 * magnitude);
        }
        advance(&mut world);
    }
}

#[test]
fn slipping_contacts_respect_the_coulomb_bound() {
    let mut world = world(1e-3);
    let friction_angle: f64 = 0.5;
    let material = Material::new(1e7, 0.3, friction_angle);
    let a = world.add_body(Body::sphere(RADIUS, DVec3::ZERO).with_material(material));
    let b = world.add_body(
        Body::sphere(RADIUS, DVec3::new(2.0 * RADIUS - 5e-7, 0.0, 0.0))
            .with_material(material)
            .with_velocity(DVec3::new(0.0, 1e-2, 0.0), DVec3::ZERO),
    );

    let mut slipped = 0;
    for _ in 0..20 {
        world.step().expect("step");
        let state = &world.interaction_between(a, b).expect("pair").state;
        assert!(state.contact);
        let bound = state.normal_contact_force.length() * friction_angle.tan();
        if state.slip {
            slipped += 1;
            assert!(
                state.shear_contact_force.length() <= bound * (1.0 + 1e-12),
                "{:e} > {bound:e}",
                state.shear_contact_force.length()
            );
        }
    }
    assert!(slipped > 0);
}

#[test]
fn disabled_channels_produce_no_torque() {
    let config = LubricationConfig::default()
        .with_cutoff_factor(2.0)
        .with_all_channels(false);
    let mut world = LubricationWorld::with_config(1e-4, config)
        .expect("valid config")
        .with_pair_builder(PairPhysicsBuilder::new(1e-3, 1e-3));
    let ids = cluster(&mut world);

    world.step().expect("step");
    for id in ids {
        assert_eq!(world.torque(id), DVec3::ZERO);
        assert_eq!(world.force(id), DVec3::ZERO);
    }
}

#[test]
fn separating_pairs_are_dropped_beyond_the_cutoff() {
    let mut world = world(1e-3);
    let a = world.add_body(Body::sphere(RADIUS, DVec3::ZERO));
    let b = world.add_body(
        Body::sphere(RADIUS, DVec3::new(2.5e-3, 0.0, 0.0))
            .with_velocity(DVec3::new(1e-1, 0.0, 0.0), DVec3::ZERO),
    );

    let report = world.step().expect("step");
    assert_eq!(report.pairs_created, 1);
    assert!(world.interaction_between(a, b).is_some());

    // past the cutoff of 2·a, still moving apart
    if let Some(body) = world.body_mut(b) {
        body.position.x = 5.0e-3;
    }
    let report = world.step().expect("step");
    assert_eq!(report.pairs_dropped, 1);
    assert!(world.interaction_between(a, b).is_none());
    assert!(world.interactions().is_empty());
}

#[test]
fn per_body_stress_uses_the_lever_arm_to_the_contact_point() {
    let mut world = world(1e-4);
    let a = world.add_body(Body::sphere(RADIUS, DVec3::ZERO));
    let b = world.add_body(
        Body::sphere(RADIUS, DVec3::new(2.0 * RADIUS + 2e-6, 0.0, 0.0))
            .with_velocity(DVec3::new(-1e-3, 2e-3, 0.0), DVec3::ZERO),
    );
    world.step().expect("step");
    if let Some(body) = world.body_mut(b) {
        body.position.x -= 1e-7;
    }
    world.step().expect("step");

    let stresses = world.stress_for_each_body();
    let interaction = world.interaction_between(a, b).expect("pair");
    let geometry = interaction.geometry.expect("evaluated this step");
    let volume = 4.0 / 3.0 * std::f64::consts::PI * RADIUS.powi(3);
    let lever = geometry.contact_point / volume;

    let force = interaction.state.normal_lubrication_force;
    let expected = DMat3::from_cols(force * lever.x, force * lever.y, force * lever.z);
    let measured = stresses[a.index()].normal_lubrication;
    for (m, e) in measured.to_cols_array().iter().zip(expected.to_cols_array()) {
        assert_relative_eq!(*m, e, epsilon = 1e-12 * expected.x_axis.x.abs().max(1e-30));
    }
    assert!(expected.x_axis.x.abs() > 0.0);
}

#[test]
fn bulk_stress_requires_a_periodic_cell() {
    let mut world = world(1e-4);
    cluster(&mut world);
    world.step().expect("step");
    assert_eq!(
        world.total_stresses(),
        Err(LubricationError::NonPeriodicDomain)
    );
}

#[test]
fn bulk_stress_of_a_wrapped_pair_is_force_times_branch_over_volume() {
    let edge = 10.0 * RADIUS;
    let mut gradient = DMat3::ZERO;
    gradient.y_axis.x = 10.0;
    let cell = PeriodicCell::cube(edge).with_velocity_gradient(gradient);
    let mut world = world(1e-4).with_periodic_cell(cell);

    // the pair touches across the x boundary of the cell
    let a = world.add_body(Body::sphere(RADIUS, DVec3::new(0.5 * RADIUS, 5.0 * RADIUS, 0.0)));
    let b = world.add_body(Body::sphere(
        RADIUS,
        DVec3::new(edge - 1.5 * RADIUS - 3e-6, 5.0 * RADIUS, 0.0),
    ));
    world.step().expect("step");
    if let Some(body) = world.body_mut(b) {
        body.position.x += 1e-7;
    }
    world.step().expect("step");

    let interaction = world.interaction_between(a, b).expect("pair");
    assert_eq!(interaction.cell_dist, IVec3::new(-1, 0, 0));
    let geometry = interaction.geometry.expect("evaluated");

    let branch = world.body(b).expect("b").position + geometry.shift2 - world.body(a).expect("a").position;
    let force = interaction.state.normal_lubrication_force;
    assert!(force.length() > 0.0);

    let bulk = world.total_stresses().expect("periodic");
    let expected = DMat3::from_cols(force * branch.x, force * branch.y, force * branch.z) * (1.0 / cell.volume());
    let scale = expected.x_axis.x.abs();
    for (m, e) in bulk
        .normal_lubrication
        .to_cols_array()
        .iter()
        .zip(expected.to_cols_array())
    {
        assert_relative_eq!(*m, e, epsilon = 1e-9 * scale);
    }
}
