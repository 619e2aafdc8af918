//! Character relationship networks.
//!
//! Characters from every submitted work are merged into one undirected
//! graph keyed by name. Relationships are symmetric and self-links are
//! dropped. The report carries size and density metrics, degree and
//! betweenness centrality, connected communities and role/relationship
//! tallies, plus a `chart` object that `POST /visualize` accepts as
//! network data.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

/// Upper bound on distinct characters in one network.
pub const MAX_NETWORK_CHARACTERS: usize = 500;

/// Characters listed under `central_characters`.
const TOP_CENTRAL: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkRequest {
    #[serde(default)]
    pub works: Vec<NetworkWork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkWork {
    pub title: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub characters: Vec<CharacterEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterEntry {
    pub name: String,
    pub role: Option<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkMetrics {
    pub total_characters: usize,
    pub total_connections: usize,
    pub average_degree: f64,
    pub density: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterCentrality {
    pub character: String,
    pub role: Option<String>,
    pub work: Option<String>,
    pub degree: usize,
    pub degree_centrality: f64,
    pub betweenness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Community {
    pub id: usize,
    pub size: usize,
    pub density: f64,
    pub characters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tally {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub metrics: NetworkMetrics,
    pub central_characters: Vec<CharacterCentrality>,
    pub communities: Vec<Community>,
    pub isolated_characters: Vec<String>,
    pub relationship_types: Vec<Tally>,
    pub roles: Vec<Tally>,
    pub chart: Value,
}

#[derive(Debug, Default)]
struct Node {
    role: Option<String>,
    work: Option<String>,
    links: BTreeSet<String>,
}

/// Undirected character graph with deterministic (name) ordering.
#[derive(Debug, Default)]
pub struct CharacterGraph {
    nodes: BTreeMap<String, Node>,
    relationship_types: BTreeMap<String, usize>,
}

fn clean(text: &str) -> Option<String> {
    let t = text.trim();
    (!t.is_empty()).then(|| t.to_string())
}

impl CharacterGraph {
    pub fn from_works(works: &[NetworkWork]) -> Self {
        let mut graph = Self::default();
        for work in works {
            let title = work.title.as_deref().and_then(clean);
            for character in &work.characters {
                let Some(name) = clean(&character.name) else {
                    continue;
                };
                let node = graph.nodes.entry(name.clone()).or_default();
                if let Some(role) = character.role.as_deref().and_then(clean) {
                    node.role = Some(role);
                }
                if title.is_some() {
                    node.work = title.clone();
                }
                for rel in &character.relationships {
                    let Some(target) = clean(&rel.target) else {
                        continue;
                    };
                    if let Some(kind) = rel.kind.as_deref().and_then(clean) {
                        *graph.relationship_types.entry(kind).or_insert(0) += 1;
                    }
                    if target == name {
                        continue;
                    }
                    graph.link(&name, &target);
                }
            }
        }
        graph
    }

    fn link(&mut self, a: &str, b: &str) {
        self.nodes
            .entry(a.to_string())
            .or_default()
            .links
            .insert(b.to_string());
        self.nodes
            .entry(b.to_string())
            .or_default()
            .links
            .insert(a.to_string());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.links.len()).sum::<usize>() / 2
    }

    pub fn degree(&self, name: &str) -> usize {
        self.nodes.get(name).map_or(0, |n| n.links.len())
    }

    pub fn metrics(&self) -> NetworkMetrics {
        let n = self.len();
        let m = self.edge_count();
        let max_edges = n * n.saturating_sub(1) / 2;
        NetworkMetrics {
            total_characters: n,
            total_connections: m,
            average_degree: if n > 0 { 2.0 * m as f64 / n as f64 } else { 0.0 },
            density: if max_edges > 0 { m as f64 / max_edges as f64 } else { 0.0 },
        }
    }

    /// Normalized betweenness centrality (Brandes, unweighted).
    pub fn betweenness(&self) -> BTreeMap<String, f64> {
        let names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        let index: BTreeMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let adjacency: Vec<Vec<usize>> = names
            .iter()
            .map(|n| self.nodes[*n].links.iter().map(|t| index[t.as_str()]).collect())
            .collect();

        let n = names.len();
        let mut scores = vec![0.0_f64; n];
        for s in 0..n {
            let mut stack = Vec::with_capacity(n);
            let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut paths = vec![0.0_f64; n];
            let mut dist: Vec<Option<usize>> = vec![None; n];
            paths[s] = 1.0;
            dist[s] = Some(0);

            let mut queue = VecDeque::from([s]);
            while let Some(v) = queue.pop_front() {
                stack.push(v);
                let dv = dist[v].unwrap_or(0);
                for &w in &adjacency[v] {
                    if dist[w].is_none() {
                        dist[w] = Some(dv + 1);
                        queue.push_back(w);
                    }
                    if dist[w] == Some(dv + 1) {
                        paths[w] += paths[v];
                        preds[w].push(v);
                    }
                }
            }

            let mut delta = vec![0.0_f64; n];
            while let Some(w) = stack.pop() {
                for &v in &preds[w] {
                    delta[v] += paths[v] / paths[w] * (1.0 + delta[w]);
                }
                if w != s {
                    scores[w] += delta[w];
                }
            }
        }

        // Each undirected pair was counted from both ends.
        let scale = if n > 2 {
            1.0 / ((n - 1) * (n - 2)) as f64
        } else {
            0.0
        };
        names
            .into_iter()
            .zip(scores)
            .map(|(name, score)| (name.to_string(), score * scale))
            .collect()
    }

    /// Connected components, largest first; singletons are left out.
    pub fn communities(&self) -> Vec<Community> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut groups: Vec<Vec<String>> = Vec::new();
        for start in self.nodes.keys() {
            if !seen.insert(start.as_str()) {
                continue;
            }
            let mut members = vec![start.clone()];
            let mut queue = VecDeque::from([start.as_str()]);
            while let Some(current) = queue.pop_front() {
                for next in &self.nodes[current].links {
                    if seen.insert(next.as_str()) {
                        members.push(next.clone());
                        queue.push_back(next.as_str());
                    }
                }
            }
            if members.len() > 1 {
                members.sort();
                groups.push(members);
            }
        }
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        groups
            .into_iter()
            .enumerate()
            .map(|(i, characters)| Community {
                id: i + 1,
                size: characters.len(),
                density: self.density_within(&characters),
                characters,
            })
            .collect()
    }

    fn density_within(&self, members: &[String]) -> f64 {
        let size = members.len();
        if size < 2 {
            return 0.0;
        }
        let set: BTreeSet<&str> = members.iter().map(String::as_str).collect();
        let internal: usize = members
            .iter()
            .map(|m| self.nodes[m].links.iter().filter(|t| set.contains(t.as_str())).count())
            .sum::<usize>()
            / 2;
        internal as f64 / (size * (size - 1) / 2) as f64
    }

    pub fn report(&self) -> NetworkReport {
        let n = self.len();
        let betweenness = self.betweenness();
        let communities = self.communities();

        let mut central: Vec<CharacterCentrality> = self
            .nodes
            .iter()
            .map(|(name, node)| CharacterCentrality {
                character: name.clone(),
                role: node.role.clone(),
                work: node.work.clone(),
                degree: node.links.len(),
                degree_centrality: if n > 1 {
                    node.links.len() as f64 / (n - 1) as f64
                } else {
                    0.0
                },
                betweenness: betweenness.get(name).copied().unwrap_or(0.0),
            })
            .collect();
        central.sort_by(|a, b| {
            b.degree
                .cmp(&a.degree)
                .then_with(|| b.betweenness.total_cmp(&a.betweenness))
                .then_with(|| a.character.cmp(&b.character))
        });
        central.truncate(TOP_CENTRAL);

        let mut roles: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            let role = node.role.clone().unwrap_or_else(|| "unknown".to_string());
            *roles.entry(role).or_insert(0) += 1;
        }

        NetworkReport {
            metrics: self.metrics(),
            central_characters: central,
            isolated_characters: self
                .nodes
                .iter()
                .filter(|(_, node)| node.links.is_empty())
                .map(|(name, _)| name.clone())
                .collect(),
            relationship_types: tallies(&self.relationship_types),
            roles: tallies(&roles),
            chart: self.chart(&communities),
            communities,
        }
    }

    /// `{nodes, edges}` in the shape of network chart data.
    fn chart(&self, communities: &[Community]) -> Value {
        let community_of: BTreeMap<&str, usize> = communities
            .iter()
            .flat_map(|c| c.characters.iter().map(move |m| (m.as_str(), c.id)))
            .collect();
        let nodes: Vec<Value> = self
            .nodes
            .keys()
            .map(|name| {
                json!({
                    "id": name,
                    "group": community_of.get(name.as_str()).map(|id| format!("community-{id}")),
                })
            })
            .collect();
        let edges: Vec<Value> = self
            .nodes
            .iter()
            .flat_map(|(name, node)| {
                node.links
                    .iter()
                    .filter(move |t| name < *t)
                    .map(move |t| json!({ "source": name, "target": t }))
            })
            .collect();
        json!({ "nodes": nodes, "edges": edges })
    }
}

fn tallies(counts: &BTreeMap<String, usize>) -> Vec<Tally> {
    let mut out: Vec<Tally> = counts
        .iter()
        .map(|(name, count)| Tally {
            name: name.clone(),
            count: *count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Validate a request and build its report.
pub fn analyze_network(request: &NetworkRequest) -> Result<NetworkReport, CoreError> {
    if request.works.is_empty() {
        return Err(CoreError::Validation(
            "At least one work is required for network analysis".into(),
        ));
    }
    let graph = CharacterGraph::from_works(&request.works);
    if graph.is_empty() {
        return Err(CoreError::Validation(
            "No named characters found in the submitted works".into(),
        ));
    }
    if graph.len() > MAX_NETWORK_CHARACTERS {
        return Err(CoreError::Validation(format!(
            "Networks are limited to {MAX_NETWORK_CHARACTERS} characters (got {})",
            graph.len()
        )));
    }
    Ok(graph.report())
}
