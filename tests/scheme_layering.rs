//! Scheme composition: layered registries, positional shadowing, and
//! discriminator normalization at the lookup boundary.

use cdist::access::AccessSpec;
use cdist::plugin::{AccessMethodDescriptor, PluginDescriptor};
use cdist::repository::{
    default_repository_scheme, repository_specs_equal, OciRegistryRepositorySpec, RepositorySpec,
};
use cdist::Registries;
use cdist_runtime::codec::unmarshal_typed;
use cdist_runtime::{Discriminator, FnDecoder, Registration, Scheme};
use std::sync::Arc;

// =============================================================================
// Override semantics: local entries shadow base entries
// =============================================================================

#[test]
fn test_composed_scheme_shadows_base_decoder() {
    let base = default_repository_scheme();

    // a specialized context rewrites registry URLs to go through a mirror
    let composed: Scheme<dyn RepositorySpec> = Scheme::new().with_base(Arc::clone(&base));
    composed.register(
        Discriminator::versioned("ociRegistry", "v1"),
        FnDecoder::new(|raw, codec| {
            let mut spec: OciRegistryRepositorySpec = unmarshal_typed(raw, codec)?;
            spec.base_url = format!("mirror.internal/{}", spec.base_url);
            Ok(Box::new(spec) as Box<dyn RepositorySpec>)
        }),
    );

    let payload = br#"{"type": "ociRegistry/v1", "baseUrl": "ghcr.io"}"#;

    let via_composed = composed.decode(payload).unwrap();
    assert_eq!(via_composed.name(), "mirror.internal/ghcr.io");

    // the base is untouched and keeps resolving the original decoder
    let via_base = base.decode(payload).unwrap();
    assert_eq!(via_base.name(), "ghcr.io");
}

#[test]
fn test_unshadowed_types_fall_through_to_base() {
    let base = default_repository_scheme();
    let composed: Scheme<dyn RepositorySpec> = Scheme::new().with_base(Arc::clone(&base));

    let payload = br#"{"type": "CommonTransportFormat/v1", "filePath": "/data/t.ctf"}"#;
    let spec = composed.decode(payload).unwrap();
    assert_eq!(spec.name(), "/data/t.ctf");
}

// =============================================================================
// Discriminator normalization: split and combined forms hit one entry
// =============================================================================

#[test]
fn test_split_and_combined_discriminators_decode_identically() {
    let registries = Registries::bootstrap();
    let ctx = registries.repository_context();

    let combined = ctx
        .decode(br#"{"type": "ociRegistry/v1", "baseUrl": "ghcr.io"}"#)
        .unwrap();
    let split = ctx
        .decode(br#"{"kind": "ociRegistry", "version": "v1", "baseUrl": "ghcr.io"}"#)
        .unwrap();

    assert_eq!(combined.name(), split.name());
    // both normalize to the same canonical re-emission
    assert!(repository_specs_equal(combined.as_ref(), split.as_ref()));
}

// =============================================================================
// Plugin installation: layering without mutating the shared registry
// =============================================================================

fn descriptor(name: &str, methods: &[&str]) -> PluginDescriptor {
    PluginDescriptor {
        version: "v1".into(),
        plugin_name: name.into(),
        plugin_version: "1.0.0".into(),
        short_description: String::new(),
        access_methods: methods
            .iter()
            .map(|m| AccessMethodDescriptor {
                name: (*m).into(),
                version: Some("v1".into()),
                description: String::new(),
            })
            .collect(),
    }
}

#[test]
fn test_plugin_shadows_builtin_access_method() {
    let mut registries = Registries::bootstrap();
    let shared = Arc::clone(registries.access_types());

    let installed = registries
        .install_plugin(descriptor("s3-turbo", &["s3"]))
        .unwrap();
    // fresh layer: the registration is an insert, the shadowing is positional
    assert_eq!(installed.registrations[0].outcome, Registration::Inserted);

    // the effective registry resolves the plugin's decoder
    let spec = registries
        .access_types()
        .decode(br#"{"type": "s3/v1", "bucket": "data", "key": "k"}"#)
        .unwrap();
    assert!(spec.describe().contains("plugin s3-turbo"));

    // the registry shared before installation still uses the builtin
    let spec = shared
        .decode(br#"{"type": "s3/v1", "bucket": "data", "key": "k"}"#)
        .unwrap();
    assert_eq!(spec.describe(), "S3 object data/k");
}

#[test]
fn test_plugin_reconfiguration_replaces_binding() {
    let registries = Registries::bootstrap();
    let installed = cdist::plugin::install_plugin(
        descriptor("helm", &["helmChart"]),
        Arc::clone(registries.access_types()),
    )
    .unwrap();

    // re-registering the same type on the plugin's scheme is the
    // documented hot-reconfiguration path; the outcome says so
    let outcome = installed.access_types.register(
        Discriminator::versioned("helmChart", "v1"),
        FnDecoder::new(|raw, codec| {
            Ok(Box::new(cdist::access::UnknownAccessSpec::parse(raw, codec)?)
                as Box<dyn AccessSpec>)
        }),
    );
    assert_eq!(outcome, Registration::Replaced);

    // last registration wins
    let spec = installed
        .access_types
        .decode(br#"{"type": "helmChart/v1"}"#)
        .unwrap();
    assert!(spec.describe().starts_with("unknown access method"));
}
