//! Parse and validate the WGSL sources with naga, and check that the uniform
//! block the shaders declare matches the host-side layout.

use pointswarm::shader::{ShaderControls, RENDER_SOURCE, UPDATE_SOURCE};

fn validate(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn entry_point<'a>(module: &'a naga::Module, name: &str) -> Option<&'a naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.name == name)
}

fn controls_span(module: &naga::Module) -> Option<u32> {
    module.types.iter().find_map(|(_, ty)| match (&ty.name, &ty.inner) {
        (Some(name), naga::TypeInner::Struct { span, .. }) if name == "Controls" => Some(*span),
        _ => None,
    })
}

#[test]
fn update_shader_validates() {
    let module = validate(UPDATE_SOURCE).expect("update shader should be valid");
    let main = entry_point(&module, "main").expect("compute entry point");
    assert_eq!(main.stage, naga::ShaderStage::Compute);
    assert_eq!(main.workgroup_size, [pointswarm::shader::WORKGROUP_SIZE, 1, 1]);
}

#[test]
fn render_shader_validates() {
    let module = validate(RENDER_SOURCE).expect("render shader should be valid");
    let vs = entry_point(&module, "vs_main").expect("vertex entry point");
    let fs = entry_point(&module, "fs_main").expect("fragment entry point");
    assert_eq!(vs.stage, naga::ShaderStage::Vertex);
    assert_eq!(fs.stage, naga::ShaderStage::Fragment);
}

#[test]
fn uniform_block_matches_host_layout() {
    let host = std::mem::size_of::<ShaderControls>() as u32;
    for source in [UPDATE_SOURCE, RENDER_SOURCE] {
        let module = validate(source).expect("shader should be valid");
        assert_eq!(controls_span(&module), Some(host));
    }
}

#[test]
fn broken_shader_is_rejected() {
    let broken = UPDATE_SOURCE.replace("fn main", "fn main(");
    assert!(validate(&broken).is_err());
}
