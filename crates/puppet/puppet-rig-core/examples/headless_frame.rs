//! Runs a few frames of a procedural face against the recording renderer and
//! prints what a GPU backend would have received.

use glam::{Vec2, Vec3};
use puppet_rig_core::{
    Config, Deformer, Engine, ExpressionBlend, Expression, ExpressionParameter, FrameInputs, Mesh,
    Model, RecordingRenderer, RenderCall,
};

fn build_model() -> Model {
    let mut model = Model::default();
    model.add_standard_parameters();

    model.deformers = vec![
        Deformer::root("def_face"),
        Deformer::child_of("def_left_eye", "def_face", Vec2::new(-0.25, 0.15)),
        Deformer::child_of("def_jaw", "def_face", Vec2::new(0.0, -0.05)),
    ];

    let face = Mesh::quad("mesh_face", Vec2::splat(0.7), Vec3::new(0.95, 0.8, 0.72), "def_face");
    let mask = Mesh {
        draw_order: 5,
        ..Mesh::quad("mask_left_eye", Vec2::new(0.12, 0.06), Vec3::ONE, "def_left_eye")
    };
    let iris = Mesh {
        draw_order: 6,
        clip_mask_id: Some("mask_left_eye".into()),
        ..Mesh::quad(
            "mesh_left_iris",
            Vec2::splat(0.06),
            Vec3::new(0.2, 0.4, 0.9),
            "def_left_eye",
        )
    };
    let mouth = Mesh {
        draw_order: 7,
        ..Mesh::quad("mesh_mouth", Vec2::new(0.18, 0.05), Vec3::new(0.8, 0.2, 0.2), "def_jaw")
    };
    model.meshes = vec![face, mask, iris, mouth];
    model.tag_face_part("mask_left_eye", "eye_left");
    model.tag_face_part("mesh_left_iris", "eye_left");
    model.tag_face_part("mesh_mouth", "mouth");

    // blink and mouth-open are driven by the built-ins in auto mode, so the
    // expression sticks to form and brow
    model.expressions.push(Expression {
        name: "smirk".into(),
        parameters: vec![
            ExpressionParameter {
                parameter_id: "ParamMouthForm".into(),
                delta: 0.6,
                mode: ExpressionBlend::Override,
                priority: 10,
            },
            ExpressionParameter {
                parameter_id: "ParamBrowLY".into(),
                delta: 0.3,
                mode: ExpressionBlend::Additive,
                priority: 0,
            },
        ],
    });
    model
}

fn main() -> anyhow::Result<()> {
    let mut engine = Engine::new(build_model(), Config::default())?;
    let mut renderer = RecordingRenderer::new(8);
    engine.build_meshes(&mut renderer);
    renderer.take_calls();

    for frame in 0..4 {
        let t = frame as f32 * 0.03;
        let inputs = FrameInputs::at(t, 0.03).with_expression("smirk", 1.0);
        engine.frame(&inputs, &mut renderer, 1280, 720);

        let draws = renderer
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Draw(_)))
            .count();
        let params = engine.parameters();
        println!(
            "t={t:.2} eyeL={:.3} mouth={:.3} form={:.2} browL={:.2} draws={draws}",
            params.value("ParamEyeLOpen").unwrap_or_default(),
            params.value("ParamMouthOpenY").unwrap_or_default(),
            params.value("ParamMouthForm").unwrap_or_default(),
            params.value("ParamBrowLY").unwrap_or_default(),
        );
        if let Some(iris) = engine.deformed_positions("mesh_left_iris") {
            println!("  iris: {iris:?}");
        }
        renderer.take_calls();
    }
    Ok(())
}
