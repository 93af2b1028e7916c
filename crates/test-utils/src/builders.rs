#![allow(dead_code)]

use serde_json::json;

/// One newline-terminated JSON log line.
pub fn record_line(severity: &str, message: &str) -> String {
    format!("{}\n", json!({ "severity": severity, "message": message }))
}

pub fn info_line(message: &str) -> String {
    record_line("INFO", message)
}

pub fn debug_line(message: &str) -> String {
    record_line("DEBUG", message)
}

pub fn error_line(message: &str) -> String {
    record_line("ERROR", message)
}

/// A realistic gcp-format line with extra fields alongside the required ones.
pub fn gcp_line(severity: &str, message: &str) -> String {
    format!(
        "{}\n",
        json!({
            "severity": severity,
            "message": message,
            "time": "2021-08-10T12:00:00.000000Z",
            "target": "radicle_org_node::node",
            "spans": [{ "name": "sync", "urn": "rad:git:hnrkbtw9t1of4ykjy6er4qqwxtc54k9943eto" }],
        })
    )
}

const SEEDED: &str = "hnrkjajuucc6zp5eknt3s9xykqsrus44cjimy";
const FETCHED: &str = "hnrkbtw9t1of4ykjy6er4qqwxtc54k9943eto";
const REMOTE: &str = "hyn9diwfnytahjq8u3iw63h9jte1ydcatxax3saymwdxqu1zo645pe";

fn project_refs(urn: &str, oid: &str) -> Vec<String> {
    vec![
        format!(r#"Setting ref "refs/namespaces/{urn}/refs/heads/master" -> {oid}"#),
        format!(r#"Setting ref "refs/namespaces/{urn}/refs/remotes/{REMOTE}/heads/master" -> {oid}"#),
        format!(
            r#"Setting ref "refs/namespaces/{urn}/HEAD" -> "refs/namespaces/{urn}/refs/heads/master""#
        ),
    ]
}

/// The six "Setting ref" messages the bootstrap node logs once both seeded
/// projects are in place.
pub fn bootstrap_milestones() -> Vec<String> {
    let mut all = project_refs(SEEDED, "2ceeb04ce6379bff1eba34ee9b498209f6435ae6");
    all.extend(project_refs(FETCHED, "acce81a6568ec4342586a71a314485408c264068"));
    all
}

/// The three messages the replicator logs after fetching the second project.
pub fn replicator_milestones() -> Vec<String> {
    project_refs(FETCHED, "acce81a6568ec4342586a71a314485408c264068")
}

/// Ref the scenario expects on disk for both nodes.
pub fn fetched_remote_ref() -> String {
    format!("refs/namespaces/{FETCHED}/refs/remotes/{REMOTE}/heads/master")
}

/// Unrelated chatter a node emits between milestones.
pub fn noise_lines(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i % 3 {
            0 => info_line(&format!("peer event #{i}")),
            1 => debug_line(&format!("gossip tick {i}")),
            _ => record_line("WARN", &format!("slow fetch {i}")),
        })
        .collect()
}

/// A scenario file that passes validation.
pub fn valid_scenario_toml() -> String {
    let quote = |ms: Vec<String>| {
        ms.iter()
            .map(|m| format!("    '{m}',"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        r#"
[network]
subgraph = "https://api.thegraph.com/subgraphs/name/radicle-dev/radicle-orgs"
rpc_url = "wss://rpc.example"
orgs = ["0x0000000000000000000000000000000000000000"]
urns = ["rad:git:{SEEDED}", "rad:git:{FETCHED}"]

[bootstrap]
listen = "127.0.0.1:8776"
web_server_listen = "127.0.0.1:8336"
milestones = [
{bootstrap}
]
expect_refs = ["{fetched}"]

[replicator]
listen = "127.0.0.1:8777"
web_server_listen = "127.0.0.1:8337"
bootstrap_peer = "hybju4ci46qn4nj844ogabz45y5o98nqrdxs3pmksj5fok9wgwa1bq@127.0.0.1:8776"
milestones = [
{replicator}
]
expect_refs = ["{fetched}"]
"#,
        bootstrap = quote(bootstrap_milestones()),
        replicator = quote(replicator_milestones()),
        fetched = fetched_remote_ref(),
    )
}
