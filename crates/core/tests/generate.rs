//! End-to-end generation against the fixture documents.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use hookgen_core::emit::query_key;
use hookgen_core::output::{plan, write};
use hookgen_core::route::{FailureSubject, HttpMethod, Route};
use hookgen_core::{
    Document, DocumentSource, EmitConfig, GeneratedOutput, Grouping, Int64Repr, generate,
    generate_from_source, parse_document,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn discord() -> Document {
    let text = fs::read_to_string(fixture("discord.yaml")).unwrap();
    parse_document(&text, None).unwrap()
}

fn file<'a>(output: &'a GeneratedOutput, name: &str) -> &'a str {
    output
        .files
        .iter()
        .find(|file| file.path == Path::new(name))
        .map(|file| file.contents.as_str())
        .expect("generated file")
}

fn route<'a>(output: &'a GeneratedOutput, method: HttpMethod, path: &str) -> &'a Route {
    output
        .model
        .routes
        .iter()
        .find(|route| route.method == method && route.path == path)
        .unwrap()
}

#[test]
fn test_generation_is_deterministic() {
    let config = EmitConfig::default();
    let first = generate(&discord(), &config);
    let second = generate(&discord(), &config);
    assert_eq!(first.files, second.files);
}

#[test]
fn test_file_layout() {
    let output = generate(&discord(), &EmitConfig::default());
    let paths: Vec<_> = output
        .files
        .iter()
        .map(|file| file.path.display().to_string())
        .collect();
    assert_eq!(
        paths,
        [
            "schemas.ts",
            "client.ts",
            "gateway.ts",
            "guilds.ts",
            "channels.ts",
            "attachments.ts",
            "posts.ts",
            "index.ts",
        ]
    );
    assert!(file(&output, "index.ts").contains("export * from \"./schemas\";\nexport * from \"./client\";\nexport * from \"./gateway\";"));
    assert!(
        file(&output, "schemas.ts")
            .starts_with("// This file was generated by hookgen from \"Discord Subset\". Do not edit it by hand.\n\n")
    );
}

#[test]
fn test_query_keys() {
    let output = generate(&discord(), &EmitConfig::default());

    let gateway = route(&output, HttpMethod::Get, "/gateway");
    assert_eq!(query_key(gateway, None), json!(["/gateway"]));
    assert!(
        file(&output, "gateway.ts")
            .contains("export const getGetGatewayQueryKey = () => [\"/gateway\"] as const;")
    );

    let guild = route(&output, HttpMethod::Get, "/guilds/{guild_id}");
    let args = json!({ "param": { "guild_id": "81384788765712384" } });
    assert_eq!(
        query_key(guild, Some(&args)),
        json!(["/guilds/:guild_id", { "param": { "guild_id": "81384788765712384" } }])
    );
    assert_eq!(query_key(guild, Some(&args)), query_key(guild, Some(&args)));

    let other_guild = json!({ "param": { "guild_id": "41771983423143937" } });
    assert_ne!(query_key(guild, Some(&args)), query_key(guild, Some(&other_guild)));
    let with_query = json!({
        "param": { "guild_id": "81384788765712384" },
        "query": { "with_counts": true }
    });
    assert_ne!(query_key(guild, Some(&args)), query_key(guild, Some(&with_query)));
    assert!(file(&output, "guilds.ts").contains(
        "export const getGetGuildsGuildIdQueryKey = (args: GetGuildsGuildIdArgs) => [\"/guilds/:guild_id\", args] as const;"
    ));
}

#[test]
fn test_path_level_parameters_are_inherited() {
    let output = generate(&discord(), &EmitConfig::default());
    let ban = route(&output, HttpMethod::Put, "/guilds/{guild_id}/bans/{user_id}");
    let names: Vec<_> = ban.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["guild_id", "user_id", "X-Audit-Log-Reason"]);

    let guilds = file(&output, "guilds.ts");
    assert!(guilds.contains("  header?: {\n    \"X-Audit-Log-Reason\"?: string;\n  };\n"));
    assert!(guilds.contains("  json?: {\n    delete_message_seconds?: number;\n  };\n"));
}

#[test]
fn test_optional_fields_follow_required() {
    let output = generate(&discord(), &EmitConfig::default());
    let schemas = file(&output, "schemas.ts");
    assert!(schemas.contains(
        "export interface Post {\n  id: string;\n  post: string;\n  createdAt?: string;\n}\n"
    ));
    assert!(schemas.contains("  icon?: string | null;\n"));
    assert!(schemas.contains("  reason?: string | null;\n"));
    assert!(schemas.contains("/** Unique id. */\nexport type Snowflake = string;\n"));
}

#[test]
fn test_multipart_binary_field_is_blob() {
    let output = generate(&discord(), &EmitConfig::default());
    assert!(file(&output, "attachments.ts").contains(
        "export interface PostAttachmentsArgs {\n  form: {\n    file: Blob;\n    description?: string;\n  };\n}\n"
    ));
    // JSON wins over multipart when both are offered.
    assert!(file(&output, "channels.ts").contains(
        "export interface PostChannelsChannelIdMessagesArgs {\n  param: {\n    channel_id: Snowflake;\n  };\n  json: MessageCreate;\n}\n"
    ));
}

#[test]
fn test_one_of_success_response() {
    let output = generate(&discord(), &EmitConfig::default());
    let posts = file(&output, "posts.ts");
    assert!(posts.contains(
        "export type GetPostsIdResponse = {\n  status: 200;\n  data: Post | Message;\n};\n"
    ));
    assert!(posts.contains("import type { Post, Message } from \"./schemas\";"));
}

#[test]
fn test_recursive_schemas_stay_named() {
    let output = generate(&discord(), &EmitConfig::default());
    assert!(output.model.schemas["ThreadNode"].recursive);
    assert!(output.model.schemas["Message"].recursive);

    let schemas = file(&output, "schemas.ts");
    assert!(schemas.contains(
        "export interface ThreadNode {\n  id: string;\n  children: ThreadNode[];\n}\n"
    ));
    assert!(schemas.contains("  referenced_message?: Message | null;\n"));
}

#[test]
fn test_all_of_child_extending_parent() {
    let text = r##"{
  "openapi": "3.1.0",
  "info": { "title": "Tree", "version": "1" },
  "paths": {
    "/nodes": {
      "get": {
        "responses": {
          "200": {
            "description": "ok",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Node" } } }
          }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Node": {
        "type": "object",
        "properties": {
          "child": {
            "allOf": [
              { "$ref": "#/components/schemas/Node" },
              { "type": "object", "properties": { "depth": { "type": "integer" } } }
            ]
          }
        }
      }
    }
  }
}"##;
    let output = generate(&parse_document(text, None).unwrap(), &EmitConfig::default());
    assert!(output.failures().is_empty(), "{:?}", output.failures());
    assert!(output.model.schemas["Node"].recursive);
    assert_eq!(output.model.routes.len(), 1);

    let schemas = file(&output, "schemas.ts");
    assert!(schemas.contains("export interface Node {\n"));
    assert!(schemas.contains("Node & {"), "{schemas}");
    assert!(schemas.contains("depth?: number"));
}

#[test]
fn test_failures_are_isolated() {
    let output = generate(&discord(), &EmitConfig::default());
    let subjects: Vec<String> = output
        .failures()
        .iter()
        .map(|failure| failure.subject.to_string())
        .collect();
    assert_eq!(
        subjects,
        ["schema Broken", "route GET /broken", "route GET /users/{user_id}"]
    );
    assert!(matches!(
        output.failures()[0].subject,
        FailureSubject::Schema(_)
    ));
    assert_eq!(output.failures()[0].error.kind(), "SchemaError");

    assert!(!output.model.schemas.contains_key("Broken"));
    assert!(
        output
            .model
            .routes
            .iter()
            .all(|route| route.path != "/broken" && route.path != "/users/{user_id}")
    );
    assert!(!file(&output, "schemas.ts").contains("Broken"));
    assert_eq!(output.model.routes.len(), 10);
}

#[test]
fn test_int64_as_string() {
    let config = EmitConfig {
        int64: Int64Repr::String,
        ..EmitConfig::default()
    };
    let output = generate(&discord(), &config);
    assert!(file(&output, "schemas.ts").contains("  approximate_member_count?: string;\n"));

    let output = generate(&discord(), &EmitConfig::default());
    assert!(file(&output, "schemas.ts").contains("  approximate_member_count?: number;\n"));
}

#[test]
fn test_single_grouping() {
    let config = EmitConfig {
        grouping: Grouping::Single,
        ..EmitConfig::default()
    };
    let output = generate(&discord(), &config);
    let paths: Vec<_> = output
        .files
        .iter()
        .map(|file| file.path.display().to_string())
        .collect();
    assert_eq!(paths, ["schemas.ts", "client.ts", "api.ts", "index.ts"]);
    let api = file(&output, "api.ts");
    assert!(api.contains("export function useGetGateway<"));
    assert!(api.contains("export function usePostAttachments<"));
}

#[test]
fn test_json_document_matches_yaml() {
    let text = fs::read_to_string(fixture("petstore.json")).unwrap();
    let output = generate(&parse_document(&text, None).unwrap(), &EmitConfig::default());
    assert!(output.failures().is_empty());
    let names: Vec<_> = output
        .model
        .routes
        .iter()
        .map(|route| route.name.as_str())
        .collect();
    assert_eq!(names, ["GetPets", "PostPets", "GetPetsPetId", "DeletePetsPetId"]);
    let pets = file(&output, "pets.ts");
    assert!(pets.contains("(args: GetPetsArgs = {}) => [\"/pets\", args] as const"));
    assert!(pets.contains(
        "export const getDeletePetsPetIdMutationKey = () => [\"/pets/:petId\", \"DELETE\"] as const;"
    ));
}

#[tokio::test]
async fn test_generate_from_path_and_write() {
    let source = DocumentSource::Path(fixture("discord.yaml"));
    let output = generate_from_source(&source, &EmitConfig::default())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("src").join("api");
    let changes = plan(&out, &output.files).unwrap();
    assert!(changes.iter().all(|change| change.is_new()));
    let summary = write(&out, &changes).unwrap();
    assert_eq!(summary.written.len(), output.files.len());

    let again = plan(&out, &output.files).unwrap();
    assert!(again.iter().all(|change| !change.is_stale()));
    let summary = write(&out, &again).unwrap();
    assert!(summary.written.is_empty());

    let client = fs::read_to_string(out.join("client.ts")).unwrap();
    assert!(client.contains("export function createApiClient(config: ClientConfig = {}): ApiClient"));
}

#[test]
fn test_stale_file_is_reported() {
    let output = generate(&discord(), &EmitConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let changes = plan(dir.path(), &output.files).unwrap();
    write(dir.path(), &changes).unwrap();

    fs::write(dir.path().join("gateway.ts"), "// edited\n").unwrap();
    let changes = plan(dir.path(), &output.files).unwrap();
    let stale: Vec<&Path> = changes
        .iter()
        .filter(|change| change.is_stale())
        .map(|change| change.rel_path.as_path())
        .collect();
    assert_eq!(stale, [Path::new("gateway.ts")]);
    let diff = changes
        .iter()
        .find_map(|change| change.diff())
        .unwrap();
    assert!(diff.starts_with("--- gateway.ts (current)\n+++ gateway.ts (generated)\n-// edited\n"));
}
