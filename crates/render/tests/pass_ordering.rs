use std::rc::Rc;

use glam::{Mat4, Vec3};
use landscape_render::{
    primitives, Camera, ClearFlags, DepthFormat, DepthMapPass, DirectionalLight, DrawObjectsPass,
    DrawableMesh, FrameDriver, GpuCommand, GpuDevice, Light, Material, Model, PassState,
    RecordingDevice, RenderTarget, Scene, Shader, ShadowSettings, Texture, Transform,
    UniformValue,
};

struct Fixture {
    gpu: RecordingDevice,
    depth_shader: Shader,
    material_shader: Rc<Shader>,
    cube: Rc<DrawableMesh>,
    material: Rc<Material>,
}

fn fixture() -> Fixture {
    let mut gpu = RecordingDevice::new(800, 600);
    let depth_shader = Shader::depth(&mut gpu).unwrap();
    let material_shader = Rc::new(Shader::material(&mut gpu).unwrap());
    let cube = Rc::new(primitives::cube(&mut gpu).unwrap());
    let diffuse = Texture::solid(&mut gpu, "diffuse", [200, 180, 120, 255]).unwrap();
    let material = Rc::new(Material {
        diffuse: Some(diffuse),
        specular: None,
        shininess: 16.0,
    });
    Fixture {
        gpu,
        depth_shader,
        material_shader,
        cube,
        material,
    }
}

fn settings() -> ShadowSettings {
    ShadowSettings {
        resolution: 1024,
        format: DepthFormat::Depth32,
        ..Default::default()
    }
}

fn light() -> Light {
    Light::Directional(DirectionalLight {
        direction: Vec3::new(-0.5, -1.0, -0.25),
        look_at: Vec3::ZERO,
        ..Default::default()
    })
}

#[test]
fn light_matrix_is_identity_until_depth_pass_runs() {
    let mut fx = fixture();
    let mut depth_pass =
        DepthMapPass::new(&mut fx.gpu, fx.depth_shader.clone(), settings()).unwrap();
    assert_eq!(depth_pass.light_view_projection(), Mat4::IDENTITY);
    assert_eq!(depth_pass.state(), PassState::Idle);

    let models = vec![Model::new(fx.cube.clone(), fx.material_shader.clone())];
    depth_pass.draw(&mut fx.gpu, &light(), &models);

    let expected = settings().projection() * DepthMapPass::light_view(&light());
    assert_eq!(depth_pass.light_view_projection(), expected);
    assert_ne!(expected, Mat4::IDENTITY);
    assert_eq!(depth_pass.state(), PassState::Idle);
}

#[test]
fn objects_pass_uploads_the_depth_pass_matrix() {
    let mut fx = fixture();
    let mut depth_pass =
        DepthMapPass::new(&mut fx.gpu, fx.depth_shader.clone(), settings()).unwrap();
    let mut objects_pass = DrawObjectsPass::new(800, 600);
    let camera = Camera::new(Vec3::new(0.0, 5.0, 15.0));
    let light = light();
    let models = vec![Model::new(fx.cube.clone(), fx.material_shader.clone())
        .with_material(fx.material.clone())];

    depth_pass.draw(&mut fx.gpu, &light, &models);
    objects_pass.draw(&mut fx.gpu, &camera, &light, &depth_pass, &models);

    let program = fx.material_shader.program();
    assert_eq!(
        fx.gpu.uniform(program, "light_space_matrix"),
        Some(UniformValue::Mat4(depth_pass.light_view_projection()))
    );
    assert_eq!(
        fx.gpu.uniform(program, "view_pos"),
        Some(UniformValue::Vec3(camera.position))
    );
    assert_eq!(fx.gpu.uniform(program, "shadow_map"), Some(UniformValue::Int(2)));
    assert!(fx.gpu.commands().contains(&GpuCommand::BindTexture {
        unit: 2,
        texture: depth_pass.depth_texture(),
    }));
}

#[test]
fn unlit_models_only_receive_model_matrix() {
    let mut fx = fixture();
    let depth_pass = DepthMapPass::new(&mut fx.gpu, fx.depth_shader.clone(), settings()).unwrap();
    let mut objects_pass = DrawObjectsPass::new(800, 600);
    let depth_only = Rc::new(fx.depth_shader.clone());

    // Material shader without a material, and a depth-only shader with one.
    let models = vec![
        Model::new(fx.cube.clone(), fx.material_shader.clone()),
        Model::new(fx.cube.clone(), depth_only).with_material(fx.material.clone()),
    ];

    fx.gpu.take_commands();
    objects_pass.draw(
        &mut fx.gpu,
        &Camera::default(),
        &light(),
        &depth_pass,
        &models,
    );

    let uniforms: Vec<&str> = fx
        .gpu
        .commands()
        .iter()
        .filter_map(|c| match c {
            GpuCommand::SetUniform { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(uniforms, vec!["model", "model"]);
    assert!(!fx
        .gpu
        .commands()
        .iter()
        .any(|c| matches!(c, GpuCommand::BindTexture { .. })));
}

#[test]
fn frame_runs_depth_then_objects_then_present() {
    let mut fx = fixture();
    let depth_pass = DepthMapPass::new(&mut fx.gpu, fx.depth_shader.clone(), settings()).unwrap();
    let shadow_target = depth_pass.framebuffer().target();
    let mut driver = FrameDriver::new(depth_pass, DrawObjectsPass::new(800, 600));

    let plane = Rc::new(primitives::plane(&mut fx.gpu, 10.0, 4.0).unwrap());
    let mut scene = Scene::new(light(), Camera::new(Vec3::new(0.0, 4.0, 12.0)));
    scene.add(
        Model::new(plane, fx.material_shader.clone()).with_material(fx.material.clone()),
    );
    scene.add(
        Model::new(fx.cube.clone(), fx.material_shader.clone())
            .with_material(fx.material.clone())
            .with_transform(Transform::from_translation(Vec3::new(0.0, 0.5, 0.0))),
    );

    fx.gpu.take_commands();
    let stats = driver.render(&mut fx.gpu, &scene).unwrap();
    assert_eq!(stats.frame, 0);
    assert_eq!(stats.depth_draws, 2);
    assert_eq!(stats.object_draws, 2);

    let commands = fx.gpu.take_commands();
    let position = |pred: &dyn Fn(&GpuCommand) -> bool| {
        commands.iter().position(|c| pred(c)).unwrap()
    };

    let bind_shadow = position(&|c| {
        *c == GpuCommand::BindRenderTarget {
            target: RenderTarget::Depth(shadow_target),
        }
    });
    let clear_depth = position(&|c| {
        matches!(c, GpuCommand::Clear { flags, .. } if *flags == ClearFlags::DEPTH)
    });
    let clear_both = position(&|c| {
        matches!(c, GpuCommand::Clear { flags, .. } if *flags == ClearFlags::COLOR | ClearFlags::DEPTH)
    });
    let present = position(&|c| matches!(c, GpuCommand::Present { .. }));

    assert_eq!(bind_shadow, 1);
    assert!(bind_shadow < clear_depth);
    assert!(clear_depth < clear_both);
    assert_eq!(present, commands.len() - 1);

    let draws_before_clear = commands[..clear_both]
        .iter()
        .filter(|c| matches!(c, GpuCommand::Draw { .. }))
        .count();
    assert_eq!(draws_before_clear, 2);
    assert!(commands[..clear_both].iter().all(|c| match c {
        GpuCommand::Draw { program, .. } => *program == Some(fx.depth_shader.program()),
        _ => true,
    }));

    let second = driver.render(&mut fx.gpu, &scene).unwrap();
    assert_eq!(second.frame, 1);
    assert_eq!(fx.gpu.frames_presented(), 2);
}

#[test]
fn resize_updates_objects_viewport() {
    let mut fx = fixture();
    let depth_pass = DepthMapPass::new(&mut fx.gpu, fx.depth_shader.clone(), settings()).unwrap();
    let mut driver = FrameDriver::new(depth_pass, DrawObjectsPass::new(800, 600));

    driver.resize(&mut fx.gpu, 1280, 720);
    driver.resize(&mut fx.gpu, 0, 720);
    assert_eq!(driver.objects_pass().size(), (1280, 720));
    assert_eq!(fx.gpu.surface_size(), (1280, 720));
}

#[test]
fn oversized_shadow_map_is_rejected() {
    let mut gpu = RecordingDevice::new(800, 600).with_max_texture_dimension(2048);
    let shader = Shader::depth(&mut gpu).unwrap();
    let err = DepthMapPass::new(
        &mut gpu,
        shader,
        ShadowSettings {
            resolution: 4096,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("framebuffer incomplete"));
}
