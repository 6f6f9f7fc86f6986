use glam::{Vec2, Vec3};
use puppet_rig_core::{
    renderer::RenderCall, secondary::bounds, ClipLayer, Config, DrawPlanner, Engine, FrameInputs,
    InterleavedMesh, LoopMode, Mesh, MeshHandle, MeshRenderer, Model, NameClassifier,
    PartSettings, RecordingRenderer, RenderCapabilities, RenderSettings, StencilMode,
};
use puppet_test_fixtures as fixtures;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn sample_face() -> Model {
    fixtures::models::load("sample-face").expect("sample-face fixture")
}

fn height(points: &[Vec2]) -> f32 {
    let (lo, hi) = bounds(points).expect("non-empty mesh");
    hi.y - lo.y
}

fn width(points: &[Vec2]) -> f32 {
    let (lo, hi) = bounds(points).expect("non-empty mesh");
    hi.x - lo.x
}

const STENCIL: RenderCapabilities = RenderCapabilities { stencil_bits: 8 };
const NO_STENCIL: RenderCapabilities = RenderCapabilities { stencil_bits: 0 };

#[test]
fn draw_sort_is_stable() {
    let meshes: Vec<Mesh> = [("a", 2), ("b", 1), ("c", 2), ("d", 1), ("e", 0), ("f", 1)]
        .iter()
        .map(|&(id, order)| Mesh {
            draw_order: order,
            ..Mesh::quad(id, Vec2::ONE, Vec3::ONE, "root")
        })
        .collect();
    let plan = DrawPlanner::plan(&meshes, NO_STENCIL);
    assert_eq!(plan.drawn_meshes(), vec![4, 1, 3, 5, 0, 2]);
}

#[test]
fn unresolved_mask_draws_nothing_for_that_mesh() {
    let model: Model = fixtures::models::load("missing-mask").unwrap();
    let mut engine = Engine::new(model, Config::default()).unwrap();
    let mut r = RecordingRenderer::new(8);
    engine.build_meshes(&mut r);
    engine.frame(&FrameInputs::at(0.0, 0.0), &mut r, 320, 240);

    let hair = engine.handle("hair_clipped").unwrap();
    assert!(!r.draws().contains(&hair));
    assert_eq!(
        r.draws(),
        vec![MeshHandle(0), engine.handle("accessory").unwrap()]
    );
    assert!(!r.calls().contains(&RenderCall::ClearStencil));
}

#[test]
fn without_stencil_mask_is_ignored() {
    let model: Model = fixtures::models::load("missing-mask").unwrap();
    let plan = DrawPlanner::plan(&model.meshes, NO_STENCIL);
    assert_eq!(plan.drawn_meshes(), vec![0, 1, 2]);
}

#[test]
fn full_frame_through_recording_renderer() {
    let mut engine = Engine::new(sample_face(), Config::default()).unwrap();
    let mut r = RecordingRenderer::new(8);
    engine.build_meshes(&mut r);
    assert_eq!(engine.capabilities().stencil_bits, 8);
    r.take_calls();

    engine.frame(&FrameInputs::at(0.0, 1.0 / 60.0), &mut r, 800, 600);
    let calls = r.take_calls();

    let updates = calls
        .iter()
        .filter(|c| matches!(c, RenderCall::UpdatePositions { applied: true, .. }))
        .count();
    assert_eq!(updates, 5);
    assert!(calls.contains(&RenderCall::BeginFrame {
        clear_stencil: true
    }));

    // face, mask, [mask -> iris], mouth, brow
    let h = |id: &str| engine.handle(id).unwrap();
    let draws: Vec<MeshHandle> = calls
        .iter()
        .filter_map(|c| match c {
            RenderCall::Draw(h) => Some(*h),
            _ => None,
        })
        .collect();
    assert_eq!(
        draws,
        vec![
            h("mesh_face"),
            h("mask_left_eye"),
            h("mask_left_eye"),
            h("mesh_left_iris"),
            h("mesh_mouth"),
            h("mesh_brow_left"),
        ]
    );

    let stencil: Vec<StencilMode> = calls
        .iter()
        .filter_map(|c| match c {
            RenderCall::SetStencil(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        stencil,
        vec![
            StencilMode::Disabled,
            StencilMode::Disabled,
            StencilMode::WriteMask,
            StencilMode::TestEqual,
            StencilMode::Disabled,
            StencilMode::Disabled,
            StencilMode::Disabled,
        ]
    );
    assert_eq!(
        calls.last(),
        Some(&RenderCall::SetBlend(puppet_rig_core::BlendFunc::Normal))
    );

    // uploaded buffer carries the skinned eye mask at its deformer offset
    let mask = r.mesh(h("mask_left_eye")).unwrap();
    let p0 = mask.position(0).unwrap();
    approx(p0.x, -0.37, 1e-5);
    approx(p0.y, 0.09, 1e-5);
}

#[test]
fn mouth_follows_oscillation_through_spring() {
    let mut engine = Engine::new(sample_face(), Config::default()).unwrap();
    engine.step(&FrameInputs::at(0.0, 1.0 / 60.0));

    // first bind starts at the idle value: 0.2 + 0.3 * 0.5
    approx(engine.parameters().value("ParamMouthOpen").unwrap(), 0.35, 1e-6);
    let mouth = engine.deformed_positions("mesh_mouth").unwrap();
    approx(height(mouth), 0.1 * (0.7 + 0.6 * 0.35), 1e-5);
    approx(width(mouth), 0.36, 1e-5);

    // the spring lags a jump in the target
    engine.step(&FrameInputs::at(0.9, 1.0 / 60.0));
    let target = 0.2 + 0.3 * (0.5 + 0.5 * (0.9f32 * 1.7).sin());
    let got = engine.parameters().value("ParamMouthOpen").unwrap();
    assert!(got < target && got > 0.35, "{got} vs {target}");
}

#[test]
fn blink_cycle_drives_tagged_eye() {
    let mut model = sample_face();
    let json = fixtures::settings::parts_json("sample-face").unwrap().unwrap();
    let parts = PartSettings::from_json(&json).unwrap();
    parts.apply(&mut model);
    let mut engine = Engine::new(model, Config::default()).unwrap();
    assert!(engine.roles("mesh_left_iris").unwrap().left_eye);

    engine.step(&FrameInputs::at(0.04, 1.0 / 60.0));
    approx(engine.parameters().value("ParamEyeLOpen").unwrap(), 0.5, 1e-5);
    let iris = engine.deformed_positions("mesh_left_iris").unwrap();
    approx(height(iris), 0.12 * (0.05 + 0.95 * 0.5), 1e-5);

    engine.step(&FrameInputs::at(1.0, 1.0 / 60.0));
    let iris = engine.deformed_positions("mesh_left_iris").unwrap();
    approx(height(iris), 0.12, 1e-5);
}

#[test]
fn name_classifier_misses_untagged_iris() {
    let mut engine = Engine::new(sample_face(), Config::default()).unwrap();
    engine.step(&FrameInputs::at(0.04, 0.0));
    // "mesh_left_iris" has no eye token; the mask is a generic eye
    approx(height(engine.deformed_positions("mesh_left_iris").unwrap()), 0.12, 1e-5);
    approx(
        height(engine.deformed_positions("mask_left_eye").unwrap()),
        0.12 * 0.525,
        1e-5,
    );

    engine.set_classifier(Box::new(NameClassifier));
    assert!(engine.roles("mask_left_eye").unwrap().generic_eye);
}

#[test]
fn manual_mode_applies_expressions() {
    let cfg = Config {
        auto_animate: false,
        ..Config::default()
    };
    let mut engine = Engine::new(sample_face(), cfg).unwrap();
    let inputs = FrameInputs::at(0.0, 0.0)
        .with_expression("blink", 1.0)
        .with_expression("smile", 1.0);
    engine.step(&inputs);

    let params = engine.parameters();
    assert_eq!(params.value("ParamEyeLOpen"), Some(0.0));
    approx(params.value("ParamMouthForm").unwrap(), 0.5, 1e-6);
    approx(params.value("ParamBrowLY").unwrap(), 0.25, 1e-6);

    // generic eye mask uses the average of both eyes: (0 + 1) / 2
    approx(
        height(engine.deformed_positions("mask_left_eye").unwrap()),
        0.12 * 0.525,
        1e-5,
    );
    // mouth closed in manual mode, widened by form
    let mouth = engine.deformed_positions("mesh_mouth").unwrap();
    approx(height(mouth), 0.1 * 0.7, 1e-5);
    approx(width(mouth), 0.36 * 1.1, 1e-5);
}

#[test]
fn clip_layers_sample_the_idle_clip() {
    let cfg = Config {
        names: puppet_rig_core::ParameterNames {
            eye_left_open: "unused".into(),
            eye_right_open: "unused".into(),
            mouth_open: Vec::new(),
            ..Default::default()
        },
        ..Config::default()
    };
    let mut engine = Engine::new(sample_face(), cfg).unwrap();
    assert_eq!(engine.clip_layers().len(), 1);

    engine.step(&FrameInputs::at(1.0, 0.0));
    approx(engine.parameters().value("ParamMouthOpen").unwrap(), 0.5, 1e-6);
    // 3s loop: 3.15 wraps to the closed key at 0.15
    engine.step(&FrameInputs::at(3.15, 0.0));
    approx(engine.parameters().value("ParamEyeLOpen").unwrap(), 0.0, 1e-5);

    engine.set_clip_layers(vec![ClipLayer {
        clip: "idle".into(),
        speed: 1.0,
        mode: LoopMode::Once,
    }]);
    engine.step(&FrameInputs::at(10.0, 0.0));
    approx(engine.parameters().value("ParamMouthOpen").unwrap(), 0.1, 1e-6);
}

#[test]
fn render_settings_reorder_and_hide() {
    let mut model = sample_face();
    let json = fixtures::settings::render_json("sample-face").unwrap().unwrap();
    let settings = RenderSettings::from_json(&json).unwrap();
    settings.apply(&mut model);
    assert_eq!(model.mesh("mesh_face").unwrap().draw_order, -1);
    assert_eq!(model.mesh("mesh_mouth").unwrap().draw_order, 2);
    assert!(!model.mesh("mesh_brow_left").unwrap().visible);

    let plan = DrawPlanner::plan(&model.meshes, STENCIL);
    // face, mask, [mask -> iris], mouth; brow hidden
    assert_eq!(plan.drawn_meshes(), vec![0, 1, 1, 2, 3]);
}

#[test]
fn position_update_with_wrong_count_is_ignored() {
    let mesh = Mesh::quad("q", Vec2::ONE, Vec3::ONE, "root");
    let mut r = RecordingRenderer::new(0);
    let h = r.create(&mesh);
    let before: InterleavedMesh = r.mesh(h).unwrap().clone();
    assert!(!r.update_positions(h, &[Vec2::splat(3.0); 5]));
    assert_eq!(r.mesh(h).unwrap(), &before);
}

fn mouth_target(t: f32) -> f32 {
    0.2 + 0.3 * (0.5 + 0.5 * (t * 1.7).sin())
}

#[test]
fn mouth_spring_recovers_after_low_frame_rate() {
    let mut engine = Engine::new(sample_face(), Config::default()).unwrap();
    for i in 0..300 {
        let t = i as f32 * 0.1;
        engine.step(&FrameInputs::at(t, 0.1));
        let got = engine.parameters().value("ParamMouthOpen").unwrap();
        assert!((got - mouth_target(t)).abs() < 0.1, "10fps t={t}: {got}");
    }
    assert!(engine.springs().get("ParamMouthOpen").unwrap().is_finite());

    for i in 0..600 {
        let t = 30.0 + i as f32 / 60.0;
        engine.step(&FrameInputs::at(t, 1.0 / 60.0));
        let got = engine.parameters().value("ParamMouthOpen").unwrap();
        assert!((got - mouth_target(t)).abs() < 0.1, "60fps t={t}: {got}");
    }
}

#[test]
fn hidden_mesh_is_still_skinned() {
    let mut model = sample_face();
    for m in model.meshes.iter_mut().filter(|m| m.id == "mesh_mouth") {
        m.visible = false;
    }
    let mut engine = Engine::new(model, Config::default()).unwrap();
    let mut r = RecordingRenderer::new(8);
    engine.build_meshes(&mut r);

    engine.frame(&FrameInputs::at(0.0, 1.0 / 60.0), &mut r, 800, 600);
    let first = height(engine.deformed_positions("mesh_mouth").unwrap());
    approx(first, 0.1 * (0.7 + 0.6 * 0.35), 1e-5);

    engine.frame(&FrameInputs::at(0.9, 1.0 / 60.0), &mut r, 800, 600);
    let open = engine.parameters().value("ParamMouthOpen").unwrap();
    let second = height(engine.deformed_positions("mesh_mouth").unwrap());
    approx(second, 0.1 * (0.7 + 0.6 * open), 1e-5);
    assert!(second > first);

    // positions still reach the renderer, but nothing draws the mesh
    let mouth = engine.handle("mesh_mouth").unwrap();
    assert!(r.calls().contains(&RenderCall::UpdatePositions {
        handle: mouth,
        applied: true
    }));
    assert!(!r.draws().contains(&mouth));
}

#[test]
fn hidden_mask_still_writes_stencil() {
    let mut model = sample_face();
    for m in model.meshes.iter_mut().filter(|m| m.id == "mask_left_eye") {
        m.visible = false;
    }
    let mut engine = Engine::new(model, Config::default()).unwrap();
    let mut r = RecordingRenderer::new(8);
    engine.build_meshes(&mut r);
    r.take_calls();
    engine.frame(&FrameInputs::at(0.0, 1.0 / 60.0), &mut r, 800, 600);

    let h = |id: &str| engine.handle(id).unwrap();
    assert_eq!(
        r.draws(),
        vec![
            h("mesh_face"),
            h("mask_left_eye"),
            h("mesh_left_iris"),
            h("mesh_mouth"),
            h("mesh_brow_left"),
        ]
    );
    let calls = r.calls();
    let mask_draw = calls
        .iter()
        .position(|c| *c == RenderCall::Draw(h("mask_left_eye")))
        .unwrap();
    assert_eq!(
        calls[mask_draw - 1],
        RenderCall::ClearStencil,
        "mask draws right after the stencil clear"
    );
    assert_eq!(calls[mask_draw - 2], RenderCall::SetStencil(StencilMode::WriteMask));
}

#[test]
fn auto_mode_builtins_win_over_eye_expressions() {
    let mut engine = Engine::new(sample_face(), Config::default()).unwrap();
    let inputs = FrameInputs::at(1.0, 1.0 / 60.0)
        .with_expression("blink", 1.0)
        .with_expression("smile", 1.0);
    for _ in 0..2 {
        engine.step(&inputs);
        let params = engine.parameters();
        // the blink cycle rewrites the eye after expressions
        assert_eq!(params.value("ParamEyeLOpen"), Some(1.0));
        // parameters the built-ins leave alone keep the expression, without accumulating
        approx(params.value("ParamMouthForm").unwrap(), 0.5, 1e-6);
        approx(params.value("ParamBrowLY").unwrap(), 0.25, 1e-6);
    }
}
