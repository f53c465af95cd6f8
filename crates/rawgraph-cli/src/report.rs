//! Serializable view of a compiled graph, for text and JSON dumps.

use std::io::{self, Write};

use rawgraph_core::{
    CompiledGraph, Direction, ModuleId, Node, NodeConnector, Pipeline, Roi,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GraphReport {
    pub pipeline: String,
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
    pub committed: Vec<CommittedReport>,
}

#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub id: usize,
    pub module: String,
    pub kernel: &'static str,
    pub wd: u32,
    pub ht: u32,
    pub dp: u32,
    pub connectors: Vec<ConnectorReport>,
    pub push_constants: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorReport {
    pub name: &'static str,
    pub direction: &'static str,
    pub chan: &'static str,
    pub format: &'static str,
    pub smooth: bool,
    pub roi: RoiReport,
    /// `(node, connector)` feeding a read connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<(usize, usize)>,
}

#[derive(Debug, Serialize)]
pub struct RoiReport {
    pub full_wd: u32,
    pub full_ht: u32,
    pub wd: u32,
    pub ht: u32,
    pub x: u32,
    pub y: u32,
    pub scale: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeReport {
    pub from: usize,
    pub from_connector: usize,
    pub to: usize,
    pub to_connector: usize,
}

#[derive(Debug, Serialize)]
pub struct CommittedReport {
    pub module: String,
    pub words: Vec<f32>,
}

fn module_label(pipe: &Pipeline, id: ModuleId) -> String {
    pipe.module(id).map_or_else(
        || id.to_string(),
        |m| format!("{}:{}", m.data().kind(), m.data().instance()),
    )
}

impl From<&Roi> for RoiReport {
    fn from(roi: &Roi) -> Self {
        Self {
            full_wd: roi.full_wd,
            full_ht: roi.full_ht,
            wd: roi.wd,
            ht: roi.ht,
            x: roi.x,
            y: roi.y,
            scale: roi.scale,
        }
    }
}

impl From<&NodeConnector> for ConnectorReport {
    fn from(c: &NodeConnector) -> Self {
        Self {
            name: c.name,
            direction: match c.direction {
                Direction::Read => "read",
                Direction::Write => "write",
            },
            chan: c.chan.name(),
            format: c.format.name(),
            smooth: c.smooth,
            roi: RoiReport::from(&c.roi),
            connected: c.connected.map(|l| (l.id.index(), l.connector)),
        }
    }
}

impl NodeReport {
    fn new(id: usize, node: &Node, pipe: &Pipeline) -> Self {
        Self {
            id,
            module: module_label(pipe, node.module),
            kernel: node.kernel,
            wd: node.wd,
            ht: node.ht,
            dp: node.dp,
            connectors: node.connectors().iter().map(ConnectorReport::from).collect(),
            push_constants: node.push_constants.words().to_vec(),
        }
    }
}

impl GraphReport {
    /// Collects everything a dump prints. `pipe` supplies module labels.
    pub fn new(name: &str, pipe: &Pipeline, compiled: &CompiledGraph) -> Self {
        Self {
            pipeline: name.to_string(),
            nodes: compiled
                .nodes()
                .iter()
                .enumerate()
                .map(|(i, n)| NodeReport::new(i, n, pipe))
                .collect(),
            edges: compiled
                .edges()
                .iter()
                .map(|e| EdgeReport {
                    from: e.from.index(),
                    from_connector: e.from_connector,
                    to: e.to.index(),
                    to_connector: e.to_connector,
                })
                .collect(),
            committed: compiled
                .committed_blocks()
                .iter()
                .filter(|b| !b.words.is_empty())
                .map(|b| CommittedReport {
                    module: module_label(pipe, b.module),
                    words: b.words.clone(),
                })
                .collect(),
        }
    }

    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }

    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Pipeline: {}", self.pipeline)?;
        writeln!(out, "{} nodes, {} edges", self.nodes.len(), self.edges.len())?;
        writeln!(out)?;

        for n in &self.nodes {
            writeln!(
                out,
                "[{:3}] {}/{}  {}x{}x{}",
                n.id, n.module, n.kernel, n.wd, n.ht, n.dp
            )?;
            for c in &n.connectors {
                let r = &c.roi;
                write!(
                    out,
                    "        {:5} {:8} {:4} {:4}  {}x{} of {}x{} @ ({}, {}) scale {:.4}",
                    c.direction,
                    c.name,
                    c.chan,
                    c.format,
                    r.wd,
                    r.ht,
                    r.full_wd,
                    r.full_ht,
                    r.x,
                    r.y,
                    r.scale
                )?;
                if c.smooth {
                    write!(out, " smooth")?;
                }
                if let Some((node, connector)) = c.connected {
                    write!(out, " <- [{node}].{connector}")?;
                }
                writeln!(out)?;
            }
            if !n.push_constants.is_empty() {
                let words: Vec<String> =
                    n.push_constants.iter().map(|w| format!("{w:08x}")).collect();
                writeln!(out, "        push {}", words.join(" "))?;
            }
        }

        if !self.committed.is_empty() {
            writeln!(out)?;
            writeln!(out, "Committed parameters:")?;
            for b in &self.committed {
                let words: Vec<String> = b.words.iter().map(|w| format!("{w:.6}")).collect();
                writeln!(out, "  {:16} [{}]", b.module, words.join(", "))?;
            }
        }
        Ok(())
    }
}
