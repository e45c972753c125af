use landscape_render::{validate_wgsl, ShadingMode, DEPTH_SHADER_SOURCE, MATERIAL_SHADER_SOURCE};
use wgpu::naga;

fn validate_raw(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    validator
        .validate(&module)
        .map(|_| module)
        .map_err(|err| err.emit_to_string(source))
}

#[test]
fn depth_shader_is_valid_wgsl() {
    validate_raw(include_str!("../src/shaders/depth.wgsl")).unwrap();
    validate_wgsl("depth", DEPTH_SHADER_SOURCE, ShadingMode::DepthOnly).unwrap();
}

#[test]
fn material_shader_is_valid_wgsl() {
    validate_raw(include_str!("../src/shaders/material.wgsl")).unwrap();
    validate_wgsl("material", MATERIAL_SHADER_SOURCE, ShadingMode::Material).unwrap();
}

#[test]
fn depth_shader_cannot_serve_as_material() {
    assert!(validate_wgsl("depth", DEPTH_SHADER_SOURCE, ShadingMode::Material).is_err());
}

#[test]
fn material_uniform_struct_matches_layout_size() {
    let module = validate_raw(MATERIAL_SHADER_SOURCE).unwrap();
    let (_, uniforms) = module
        .global_variables
        .iter()
        .find(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .expect("material shader declares a uniform block");
    let size = module.types[uniforms.ty].inner.size(module.to_ctx());
    assert_eq!(
        size as usize,
        landscape_render::UniformLayout::for_mode(ShadingMode::Material).size()
    );
}
