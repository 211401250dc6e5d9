mod common;

use std::fs;

use common::{FakeBackend, dir_is_empty_or_missing, write};
use shaderpack::{
    BackendError, CompileDispatcher, CompilerConfig, CompilerFlavor, HostPlatform, IncludeError,
    OutputMode, PackedShader, ShaderError, ShaderFileHeader, ShaderStage, TargetLanguage,
};
use tempfile::TempDir;

fn fake(targets: Vec<TargetLanguage>, backend: FakeBackend) -> CompileDispatcher<FakeBackend> {
    CompileDispatcher::new(&CompilerConfig::default(), targets, backend)
}

#[test]
fn single_compile_writes_spv_from_resolved_source() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(&shaders, "common.glsl", "#version 450\nvec3 tint() { return vec3(1.0); }\n");
    let shader = write(
        &shaders,
        "lit.frag",
        "#version 450\n#include \"common.glsl\"\nvoid main() {}\n",
    );

    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());
    let output_dir = out.path().join("Shaders");
    let artifact = dispatcher
        .compile_file(&shader, &output_dir, OutputMode::Single)
        .unwrap();

    assert_eq!(artifact, output_dir.join("lit.frag.spv"));
    assert!(artifact.is_file());

    let seen = dispatcher.backend().seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].stage, ShaderStage::Fragment);
    assert_eq!(seen[0].shader_name, "lit.frag");
    assert_eq!(seen[0].input.file_name().unwrap(), "lit.frag");
    assert!(!seen[0].source.contains("#include"));
    assert!(seen[0].source.contains("vec3 tint()"));
    assert_eq!(seen[0].source.matches("#version").count(), 1);
}

#[test]
fn scratch_file_is_removed_after_compile() {
    let out = TempDir::new().unwrap();
    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());

    dispatcher
        .compile("void main() {}\n", ShaderStage::Vertex, "shader.vert", out.path())
        .unwrap();

    let seen = dispatcher.backend().seen.borrow();
    assert!(!seen[0].input.exists());
    assert!(!seen[0].input.parent().unwrap().exists());
}

#[test]
fn scratch_file_is_removed_when_backend_fails() {
    let out = TempDir::new().unwrap();
    let backend = FakeBackend {
        reject: Some("broken".into()),
        ..FakeBackend::default()
    };
    let dispatcher = fake(vec![TargetLanguage::SpirV], backend);

    let err = dispatcher
        .compile("void main() {}\n", ShaderStage::Vertex, "broken.vert", out.path())
        .unwrap_err();

    assert!(matches!(err, ShaderError::Backend(_)));
    let seen = dispatcher.backend().seen.borrow();
    assert!(!seen[0].input.exists());
}

#[test]
fn glsl_suffix_is_dropped_from_scratch_name() {
    let out = TempDir::new().unwrap();
    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());

    let artifact = dispatcher
        .compile("void main() {}\n", ShaderStage::Compute, "blur.comp.glsl", out.path())
        .unwrap();

    let seen = dispatcher.backend().seen.borrow();
    assert_eq!(seen[0].input.file_name().unwrap(), "blur.comp");
    assert_eq!(artifact.file_name().unwrap(), "blur.comp.glsl.spv");
}

#[test]
fn missing_include_compiles_nothing() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let shader = write(&shaders, "shader.vert", "#include \"missing.glsl\"\nvoid main() {}\n");

    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());
    let output_dir = out.path().join("Shaders");
    let err = dispatcher
        .compile_file(&shader, &output_dir, OutputMode::Single)
        .unwrap_err();

    match err {
        ShaderError::Include(IncludeError::Missing { include, shader }) => {
            assert_eq!(include, "missing.glsl");
            assert_eq!(shader, "shader.vert");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(dispatcher.backend().calls(), 0);
    assert!(dir_is_empty_or_missing(&output_dir));
}

#[test]
fn commented_include_of_missing_file_still_compiles() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let shader = write(&shaders, "shader.vert", "// #include \"x.glsl\"\nvoid main() {}\n");

    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());
    dispatcher
        .compile_file(&shader, out.path(), OutputMode::Single)
        .unwrap();

    let seen = dispatcher.backend().seen.borrow();
    assert_eq!(seen[0].source, "// \nvoid main() {}\n");
}

#[test]
fn unknown_stage_is_rejected_before_compiling() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let shader = write(&shaders, "shader.txt", "void main() {}\n");

    let dispatcher = fake(vec![TargetLanguage::SpirV], FakeBackend::default());
    let err = dispatcher
        .compile_file(&shader, out.path(), OutputMode::Single)
        .unwrap_err();

    assert!(matches!(err, ShaderError::UnknownStage { .. }));
    assert_eq!(dispatcher.backend().calls(), 0);
}

#[test]
fn packed_artifact_layout() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let shader = write(&shaders, "mesh.vert", "void main() {}\n");

    let targets = vec![
        TargetLanguage::SpirV,
        TargetLanguage::MacosMetallib,
        TargetLanguage::IosMetallib,
    ];
    let backend = FakeBackend::with_sizes(&[
        (TargetLanguage::SpirV, 10),
        (TargetLanguage::MacosMetallib, 20),
        (TargetLanguage::IosMetallib, 30),
    ]);
    let dispatcher = fake(targets, backend);

    let artifact = dispatcher
        .compile_file(&shader, out.path(), OutputMode::Packed)
        .unwrap();
    assert_eq!(artifact, out.path().join("mesh.vert.shader"));

    let bytes = fs::read(&artifact).unwrap();
    assert_eq!(bytes.len(), ShaderFileHeader::SIZE + 60);

    let header: ShaderFileHeader =
        bytemuck::pod_read_unaligned(&bytes[..ShaderFileHeader::SIZE]);
    assert_eq!(header.sizes(), [10, 20, 30, 0, 0]);

    let mut offset = ShaderFileHeader::SIZE;
    for target in TargetLanguage::ALL {
        let len = header.size(target) as usize;
        let blob = &bytes[offset..offset + len];
        assert!(blob.iter().all(|&b| b == target.index() as u8 + 1));
        offset += len;
    }

    let parsed = PackedShader::from_bytes(&bytes).unwrap();
    assert_eq!(parsed.blob(TargetLanguage::MacosMetallib).unwrap().len(), 20);
    assert_eq!(parsed.blob(TargetLanguage::Dxil), None);

    let seen = dispatcher.backend().seen.borrow();
    let order: Vec<_> = seen.iter().map(|s| s.target).collect();
    assert_eq!(
        order,
        [TargetLanguage::SpirV, TargetLanguage::MacosMetallib, TargetLanguage::IosMetallib]
    );
    assert!(seen.iter().all(|s| !s.input.exists() && !s.output.exists()));
}

#[test]
fn packed_missing_target_is_fatal_and_writes_nothing() {
    let shaders = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let shader = write(&shaders, "mesh.vert", "void main() {}\n");

    let backend = FakeBackend {
        skip_output: Some(TargetLanguage::Dxil),
        ..FakeBackend::default()
    };
    let dispatcher = fake(vec![TargetLanguage::SpirV, TargetLanguage::Dxil], backend);

    let err = dispatcher
        .compile_file(&shader, out.path(), OutputMode::Packed)
        .unwrap_err();

    assert!(matches!(
        err,
        ShaderError::Backend(BackendError::MissingArtifact { target: TargetLanguage::Dxil, .. })
    ));
    assert!(!out.path().join("mesh.vert.shader").exists());
}

#[test]
fn packed_backend_failure_leaves_no_output_dir() {
    let out = TempDir::new().unwrap();
    let backend = FakeBackend {
        reject: Some("broken".into()),
        ..FakeBackend::default()
    };
    let dispatcher = fake(vec![TargetLanguage::SpirV, TargetLanguage::Dxil], backend);
    let output_dir = out.path().join("Shaders");

    let err = dispatcher
        .compile_packed("void main() {}\n", ShaderStage::Vertex, "broken.vert", &output_dir)
        .unwrap_err();

    assert!(matches!(err, ShaderError::Backend(_)));
    assert!(!output_dir.exists());
}

#[test]
fn empty_target_list_falls_back_to_spirv() {
    let dispatcher = fake(Vec::new(), FakeBackend::default());
    assert_eq!(dispatcher.targets(), [TargetLanguage::SpirV]);
}

#[test]
fn scratch_dir_from_config_is_used() {
    let scratch = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = CompilerConfig {
        scratch_dir: Some(scratch.path().to_path_buf()),
        ..CompilerConfig::default()
    };
    let dispatcher =
        CompileDispatcher::new(&config, vec![TargetLanguage::SpirV], FakeBackend::default());

    dispatcher
        .compile("void main() {}\n", ShaderStage::Vertex, "a.vert", out.path())
        .unwrap();

    let seen = dispatcher.backend().seen.borrow();
    assert!(seen[0].input.starts_with(scratch.path()));
    assert!(dir_is_empty_or_missing(scratch.path()));
}

#[test]
fn platform_dispatcher_uses_configured_toolchain() {
    let config = CompilerConfig::shader_connect("sc", shaderpack::CompilerVersion::SHADER_CONNECT);
    let dispatcher = CompileDispatcher::for_platform(&config, HostPlatform::MacOs);

    assert_eq!(dispatcher.targets(), config.macos.targets.as_slice());
    assert_eq!(dispatcher.backend().program(), config.macos.executable.as_path());
    assert_eq!(config.macos.flavor, CompilerFlavor::ShaderConnect);
}
