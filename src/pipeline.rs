//! The two chained-task orchestration flows.
//!
//! Both run the same analyze-then-summarize work against the inference
//! client, threading shared state by value with each step appending exactly
//! one field. The sequential pipeline is a fixed two-stage state machine; the
//! directed pipeline models the same path as a traversable graph (explicit
//! entry point, edge table, End sink) so future branching does not restructure
//! callers. Neither flow retries: the first failure aborts the run and
//! surfaces unchanged.

use std::collections::HashSet;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::client::OllamaClient;
use crate::error::{ClientError, ClientResult};

/// Shared state threaded through both flows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineState {
    pub text: String,
    pub analysis: Option<String>,
    pub summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Sequential pipeline: START -> ANALYZE -> SUMMARIZE -> DONE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analyze,
    Summarize,
    Done,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Analyze => Stage::Summarize,
            Stage::Summarize => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }
}

async fn analyze_stage(
    client: &OllamaClient,
    mut state: PipelineState,
) -> ClientResult<PipelineState> {
    let prompt = format!(
        "Analyze this text and identify the main themes: {}",
        state.text
    );
    let output = client.generate(&prompt, false, None).await?;
    state.analysis = Some(output.response);
    Ok(state)
}

async fn summarize_stage(
    client: &OllamaClient,
    mut state: PipelineState,
) -> ClientResult<PipelineState> {
    let themes = state.analysis.as_deref().unwrap_or(&state.text);
    let prompt = format!("Summarize the themes in 2-3 sentences: {}", themes);
    let output = client.generate(&prompt, false, None).await?;
    state.summary = Some(output.response);
    Ok(state)
}

/// Run the fixed two-stage pipeline on `text`.
///
/// Stages run strictly in order; a failure in either stage aborts the run and
/// propagates verbatim, never leaving a partial result with the caller.
pub async fn run_sequential(client: &OllamaClient, text: String) -> ClientResult<PipelineState> {
    let run_id = rand::random::<u32>();
    let mut state = PipelineState {
        text,
        ..PipelineState::default()
    };
    let mut stage = Stage::Analyze;
    loop {
        info!("pipeline run {:08x}: stage {:?}", run_id, stage);
        state = match stage {
            Stage::Analyze => analyze_stage(client, state).await?,
            Stage::Summarize => summarize_stage(client, state).await?,
            Stage::Done => break,
        };
        stage = stage.next();
    }
    Ok(state)
}

// ---------------------------------------------------------------------------
// Directed pipeline: explicit entry point, edge table, End sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Analyze,
    Summarize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(Node),
    End,
}

/// Errors from directed-pipeline execution.
#[derive(Debug)]
pub enum WorkflowError {
    /// The edge table loops back to an already-visited node
    Cycle { node: Node },
    /// A reachable node has no outgoing edge
    MissingEdge { node: Node },
    /// A node's inference call failed; carried unchanged
    Inference(ClientError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Cycle { node } => {
                write!(f, "Workflow cycle detected at node {:?}", node)
            }
            WorkflowError::MissingEdge { node } => {
                write!(f, "Workflow node {:?} has no outgoing edge", node)
            }
            WorkflowError::Inference(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for WorkflowError {}

impl From<ClientError> for WorkflowError {
    fn from(err: ClientError) -> Self {
        WorkflowError::Inference(err)
    }
}

#[derive(Debug, Clone)]
pub struct Workflow {
    entry: Node,
    edges: Vec<(Node, Target)>,
}

impl Workflow {
    pub fn new(entry: Node, edges: Vec<(Node, Target)>) -> Self {
        Workflow { entry, edges }
    }

    fn successor(&self, node: Node) -> Option<Target> {
        self.edges
            .iter()
            .find(|(from, _)| *from == node)
            .map(|(_, to)| *to)
    }

    /// Walk the topology from the entry point without executing anything,
    /// rejecting cycles and dangling nodes. The current two-node graph cannot
    /// loop, but a mis-edited edge table must fail here rather than spin.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut visited = HashSet::new();
        let mut current = self.entry;
        loop {
            if !visited.insert(current) {
                return Err(WorkflowError::Cycle { node: current });
            }
            match self.successor(current) {
                Some(Target::Node(next)) => current = next,
                Some(Target::End) => return Ok(()),
                None => return Err(WorkflowError::MissingEdge { node: current }),
            }
        }
    }

    /// Execute the workflow: a strict linear walk from the entry point along
    /// the edge table until End. Each node receives and returns the full
    /// state; fields a node does not touch pass through unchanged.
    pub async fn run(
        &self,
        client: &OllamaClient,
        state: PipelineState,
    ) -> Result<PipelineState, WorkflowError> {
        self.validate()?;
        let run_id = rand::random::<u32>();
        let mut state = state;
        let mut current = self.entry;
        loop {
            info!("workflow run {:08x}: node {:?}", run_id, current);
            state = match current {
                Node::Analyze => analyze_node(client, state).await?,
                Node::Summarize => summarize_node(client, state).await?,
            };
            match self.successor(current) {
                Some(Target::Node(next)) => current = next,
                Some(Target::End) => return Ok(state),
                None => return Err(WorkflowError::MissingEdge { node: current }),
            }
        }
    }
}

/// The built-in two-node analysis workflow: analyze -> summarize -> End.
pub fn analysis_workflow() -> Workflow {
    Workflow::new(
        Node::Analyze,
        vec![
            (Node::Analyze, Target::Node(Node::Summarize)),
            (Node::Summarize, Target::End),
        ],
    )
}

async fn analyze_node(
    client: &OllamaClient,
    mut state: PipelineState,
) -> ClientResult<PipelineState> {
    let prompt = format!("Analyze this text: {}", state.text);
    let output = client.generate(&prompt, false, None).await?;
    state.analysis = Some(output.response);
    Ok(state)
}

async fn summarize_node(
    client: &OllamaClient,
    mut state: PipelineState,
) -> ClientResult<PipelineState> {
    let source = state.analysis.as_deref().unwrap_or(&state.text);
    let prompt = format!("Summarize: {}", source);
    let output = client.generate(&prompt, false, None).await?;
    state.summary = Some(output.response);
    Ok(state)
}
