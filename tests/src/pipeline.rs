use crate::fixtures::{init_tracing, parses, TOKEN};
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{NativeParser, SyntaxProvider, SyntaxTree};
use solcloak_transform::obfuscator::{
    create_report, obfuscate_source, presets, ObfuscationConfig,
};
use solcloak_transform::pass;
use solcloak_transform::{PipelineContext, Transform};
use solcloak_utils::errors::{ObfuscateError, ParseError, TransformError};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A provider that is never able to describe its input.
#[derive(Debug)]
struct Unavailable;

impl SyntaxProvider for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn parse(&self, _buffer: &SourceBuffer) -> Result<SyntaxTree, ParseError> {
        Err(ParseError::Provider("exit status 1".into()))
    }
}

/// A provider that describes a different buffer than the one it was given.
#[derive(Debug)]
struct Outdated;

impl SyntaxProvider for Outdated {
    fn name(&self) -> &'static str {
        "outdated"
    }

    fn parse(&self, buffer: &SourceBuffer) -> Result<SyntaxTree, ParseError> {
        let older = SourceBuffer::new(format!("{}\n", buffer.as_str()));
        NativeParser.parse(&older)
    }
}

#[test]
fn test_full_pipeline_keeps_the_token_parseable() {
    init_tracing();
    let config = presets::default_obfuscation(Some(2024));
    let result = obfuscate_source("Token.sol", TOKEN, &config).unwrap();
    let out = &result.obfuscated_source;

    assert_eq!(result.passes.len(), 5);
    assert!(result.passes.iter().all(|p| p.error.is_none()));
    // the full-density passes always find work in the token
    for name in ["StringLiteralEncoding", "IdentifierRenaming", "ArithmeticEncoding"] {
        assert!(result.metadata.transforms_applied.iter().any(|t| t == name), "{name}");
    }
    assert!(result.obfuscated_size > result.original_size);
    assert!(out.contains("library Lib {"));
    assert!(!out.contains("contract Token"));
    assert!(parses(out), "{out}");
}

#[test]
fn test_same_seed_same_bytes() {
    let first = obfuscate_source("A.sol", TOKEN, &presets::default_obfuscation(Some(9))).unwrap();
    let second = obfuscate_source("A.sol", TOKEN, &presets::default_obfuscation(Some(9))).unwrap();
    assert_eq!(first.obfuscated_source, second.obfuscated_source);
    assert_eq!(first.aliases, second.aliases);
    assert_eq!(first.metadata.output_fingerprint, second.metadata.output_fingerprint);
}

#[test]
fn test_provider_failure_is_not_fatal() {
    init_tracing();
    let config = ObfuscationConfig {
        provider: Arc::new(Unavailable),
        ..presets::default_obfuscation(Some(1))
    };
    let result = obfuscate_source("A.sol", TOKEN, &config).unwrap();
    assert_eq!(result.obfuscated_source, TOKEN);
    assert_eq!(result.passes.len(), 5);
    for outcome in &result.passes {
        assert!(!outcome.changed);
        assert!(outcome.error.as_deref().unwrap().contains("exit status 1"));
    }
    assert!(result.metadata.transforms_applied.is_empty());
}

#[test]
fn test_description_of_another_buffer_aborts_the_file() {
    init_tracing();
    let mut ctx = PipelineContext::new(
        "A.sol",
        SourceBuffer::new(TOKEN),
        Arc::new(Outdated),
        1,
    );
    let passes = presets::light_obfuscation(Some(1)).transforms;
    let err = pass::run(&mut ctx, &passes).unwrap_err();
    assert!(matches!(err, TransformError::StaleSyntax));
    assert_eq!(ctx.buffer().as_str(), TOKEN);

    let config = ObfuscationConfig {
        provider: Arc::new(Outdated),
        ..presets::light_obfuscation(Some(1))
    };
    assert!(matches!(
        obfuscate_source("A.sol", TOKEN, &config),
        Err(ObfuscateError::Transform(TransformError::StaleSyntax))
    ));
}

#[test]
fn test_passes_see_each_others_output() {
    // renaming after literal encoding must not touch the encoded characters,
    // and arithmetic after renaming must use the aliases
    let config = ObfuscationConfig {
        seed: Some(3),
        transforms: {
            let mut passes = presets::light_obfuscation(None).transforms;
            passes.extend(presets::custom_obfuscation(None, 1.0).transforms.into_iter().filter(
                |t: &Box<dyn Transform>| t.name() == "ArithmeticEncoding",
            ));
            passes
        },
        ..ObfuscationConfig::default()
    };
    let result = obfuscate_source("Token.sol", TOKEN, &config).unwrap();
    let amount = &result.aliases["amount"];
    let parts = &result.aliases["parts"];
    assert!(result
        .obfuscated_source
        .contains(&format!("(Lib.bitwiseDivide({amount}, {parts}))")));
    assert!(result.obfuscated_source.contains("'z'+'e'+'r'+'o'"));
}

#[test]
fn test_report_is_json() {
    let result = obfuscate_source("Token.sol", TOKEN, &presets::light_obfuscation(Some(5))).unwrap();
    let report = create_report("Token.sol", &result);
    assert_eq!(report["file"], "Token.sol");
    assert_eq!(report["seed_used"], 5);
    assert_eq!(report["passes"].as_array().unwrap().len(), 2);
    assert_eq!(report["passes"][1]["name"], "IdentifierRenaming");
    assert!(report["aliases"]["totalSupply"].as_str().unwrap().starts_with("obf_"));
    let text = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["aliases"], report["aliases"]);
}

fn obfuscate_file(path: &Path, out_dir: &Path, seed: u64) -> Result<String, ObfuscateError> {
    let text = fs::read_to_string(path).map_err(|source| ObfuscateError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let label = path.file_name().unwrap().to_string_lossy().to_string();
    let result = obfuscate_source(&label, &text, &presets::default_obfuscation(Some(seed)))?;
    let target = out_dir.join(&label);
    fs::write(&target, &result.obfuscated_source).map_err(|source| ObfuscateError::Write {
        path: target.display().to_string(),
        source,
    })?;
    // locals introduced by dead code are renamed too; only report the file's own names
    Ok(result
        .aliases
        .keys()
        .filter(|name| !name.starts_with("v_"))
        .cloned()
        .collect::<Vec<_>>()
        .join(","))
}

#[tokio::test]
async fn test_files_are_processed_independently_in_parallel() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let sources = [
        ("A.sol", "contract A {\n    function alpha() public {\n        shared();\n    }\n    function shared() internal {}\n}\n"),
        ("B.sol", "contract B {\n    function beta() public {\n        shared();\n    }\n    function shared() internal {}\n}\n"),
        ("C.sol", TOKEN),
    ];
    for (name, text) in sources {
        fs::write(dir.path().join(name), text).unwrap();
    }

    let handles: Vec<_> = sources
        .iter()
        .map(|(name, _)| {
            let path = dir.path().join(name);
            let out = out.clone();
            tokio::task::spawn_blocking(move || obfuscate_file(&path, &out, 77))
        })
        .collect();
    let mut declared = Vec::new();
    for handle in handles {
        declared.push(handle.await.unwrap().unwrap());
    }

    // each file's registry only ever saw that file's names
    assert_eq!(declared[0], "A,alpha,shared");
    assert_eq!(declared[1], "B,beta,shared");
    for (name, _) in sources {
        let written = fs::read_to_string(out.join(name)).unwrap();
        assert!(parses(&written), "{name}: {written}");
    }

    // a file's output does not depend on what ran beside it
    let alone = tempfile::tempdir().unwrap();
    obfuscate_file(&dir.path().join("B.sol"), alone.path(), 77).unwrap();
    assert_eq!(
        fs::read_to_string(alone.path().join("B.sol")).unwrap(),
        fs::read_to_string(out.join("B.sol")).unwrap()
    );
}

#[tokio::test]
async fn test_unreadable_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Missing.sol");
    let out = dir.path().to_path_buf();
    let result = tokio::task::spawn_blocking(move || obfuscate_file(&missing, &out, 1))
        .await
        .unwrap();
    assert!(matches!(result, Err(ObfuscateError::Read { .. })));
}
