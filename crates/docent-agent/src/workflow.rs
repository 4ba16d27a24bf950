//! Workflow graph and executor
//!
//! A [`Graph`] is assembled with [`WorkflowBuilder`] and validated once by
//! `compile`. A [`Workflow`] pairs the compiled graph with its collaborators
//! and runs it once per message, from the entry node to [`Node::End`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use docent_ai::ReasoningEngine;
use tokio::sync::broadcast;
use tracing::debug;

use crate::classifier::{classify_intent, render_history, route_for};
use crate::config::AssistantConfig;
use crate::error::{Error, Result};
use crate::events::WorkflowEvent;
use crate::memory::update_memory;
use crate::state::{ConversationState, Route};
use crate::task::{run_task, CalculationTask, QaTask, SummarizationTask, TaskDeps};
use crate::tool::ToolRegistry;

/// Workflow nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Classify,
    Qa,
    Summarize,
    Calculate,
    UpdateMemory,
    /// Terminal; has no outgoing transition
    End,
}

impl Node {
    pub fn label(&self) -> &'static str {
        match self {
            Node::Classify => "classify",
            Node::Qa => "qa",
            Node::Summarize => "summarize",
            Node::Calculate => "calculate",
            Node::UpdateMemory => "update_memory",
            Node::End => "terminal",
        }
    }
}

/// How a node picks its successor
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Unconditional edge
    Always(Node),
    /// Follow `ConversationState::next_route` through this table
    ByRoute(Vec<(Route, Node)>),
}

impl Transition {
    fn targets(&self) -> Vec<Node> {
        match self {
            Transition::Always(node) => vec![*node],
            Transition::ByRoute(table) => table.iter().map(|(_, node)| *node).collect(),
        }
    }
}

/// A validated workflow graph
#[derive(Debug, Clone)]
pub struct Graph {
    entry: Node,
    transitions: HashMap<Node, Transition>,
}

impl Graph {
    pub fn entry(&self) -> Node {
        self.entry
    }

    /// Successor of `node` given the state after it ran
    fn next(&self, node: Node, state: &ConversationState) -> Result<Node> {
        match self.transitions.get(&node) {
            Some(Transition::Always(next)) => Ok(*next),
            Some(Transition::ByRoute(table)) => {
                let route = state.next_route.ok_or_else(|| {
                    Error::InvalidGraph(format!("node '{}' set no route", node.label()))
                })?;
                table
                    .iter()
                    .find(|(r, _)| *r == route)
                    .map(|(_, next)| *next)
                    .ok_or_else(|| {
                        Error::InvalidGraph(format!(
                            "no edge from '{}' for route '{}'",
                            node.label(),
                            route
                        ))
                    })
            }
            None => Err(Error::InvalidGraph(format!(
                "node '{}' has no transition",
                node.label()
            ))),
        }
    }
}

/// Registers nodes and transitions, then validates them into a [`Graph`]
#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    entry: Option<Node>,
    nodes: Vec<Node>,
    transitions: HashMap<Node, Transition>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: Node) -> Self {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
        self
    }

    pub fn entry(mut self, node: Node) -> Self {
        self.entry = Some(node);
        self
    }

    pub fn edge(mut self, from: Node, to: Node) -> Self {
        self.transitions.insert(from, Transition::Always(to));
        self
    }

    pub fn routes(mut self, from: Node, table: impl IntoIterator<Item = (Route, Node)>) -> Self {
        self.transitions
            .insert(from, Transition::ByRoute(table.into_iter().collect()));
        self
    }

    pub fn compile(self) -> Result<Graph> {
        let entry = self
            .entry
            .ok_or_else(|| Error::InvalidGraph("no entry node".into()))?;

        let registered: HashSet<Node> = self.nodes.iter().copied().chain([Node::End]).collect();
        if !registered.contains(&entry) {
            return Err(Error::InvalidGraph(format!(
                "entry '{}' is not a registered node",
                entry.label()
            )));
        }
        if entry == Node::End {
            return Err(Error::InvalidGraph("entry cannot be the terminal".into()));
        }
        if self.transitions.contains_key(&Node::End) {
            return Err(Error::InvalidGraph("terminal cannot have a transition".into()));
        }

        for node in &self.nodes {
            if *node == Node::End {
                continue;
            }
            let transition = self.transitions.get(node).ok_or_else(|| {
                Error::InvalidGraph(format!("node '{}' has no transition", node.label()))
            })?;
            if transition.targets().is_empty() {
                return Err(Error::InvalidGraph(format!(
                    "node '{}' has an empty route table",
                    node.label()
                )));
            }
            for target in transition.targets() {
                if !registered.contains(&target) {
                    return Err(Error::InvalidGraph(format!(
                        "edge '{}' -> '{}' targets an unregistered node",
                        node.label(),
                        target.label()
                    )));
                }
            }
        }
        for from in self.transitions.keys() {
            if !registered.contains(from) {
                return Err(Error::InvalidGraph(format!(
                    "transition from unregistered node '{}'",
                    from.label()
                )));
            }
        }

        let graph = Graph {
            entry,
            transitions: self.transitions,
        };
        check_acyclic(&graph)?;
        if !reachable(&graph).contains(&Node::End) {
            return Err(Error::InvalidGraph("terminal is not reachable".into()));
        }
        Ok(graph)
    }
}

fn check_acyclic(graph: &Graph) -> Result<()> {
    fn visit(
        node: Node,
        graph: &Graph,
        on_path: &mut HashSet<Node>,
        done: &mut HashSet<Node>,
    ) -> Result<()> {
        if done.contains(&node) {
            return Ok(());
        }
        if !on_path.insert(node) {
            return Err(Error::InvalidGraph(format!(
                "cycle through '{}'",
                node.label()
            )));
        }
        if let Some(transition) = graph.transitions.get(&node) {
            for next in transition.targets() {
                visit(next, graph, on_path, done)?;
            }
        }
        on_path.remove(&node);
        done.insert(node);
        Ok(())
    }

    let mut done = HashSet::new();
    for node in graph.transitions.keys() {
        visit(*node, graph, &mut HashSet::new(), &mut done)?;
    }
    Ok(())
}

fn reachable(graph: &Graph) -> HashSet<Node> {
    let mut seen = HashSet::new();
    let mut stack = vec![graph.entry];
    while let Some(node) = stack.pop() {
        if seen.insert(node) {
            if let Some(transition) = graph.transitions.get(&node) {
                stack.extend(transition.targets());
            }
        }
    }
    seen
}

/// The documented graph: classify, one task, memory update, terminal
pub fn standard_graph() -> Result<Graph> {
    WorkflowBuilder::new()
        .node(Node::Classify)
        .node(Node::Qa)
        .node(Node::Summarize)
        .node(Node::Calculate)
        .node(Node::UpdateMemory)
        .entry(Node::Classify)
        .routes(
            Node::Classify,
            [
                (Route::Qa, Node::Qa),
                (Route::Summarization, Node::Summarize),
                (Route::Calculation, Node::Calculate),
            ],
        )
        .edge(Node::Qa, Node::UpdateMemory)
        .edge(Node::Summarize, Node::UpdateMemory)
        .edge(Node::Calculate, Node::UpdateMemory)
        .edge(Node::UpdateMemory, Node::End)
        .compile()
}

/// A compiled graph bound to its engine, tools and configuration.
/// Shared read-only across sessions.
pub struct Workflow {
    graph: Graph,
    engine: Arc<dyn ReasoningEngine>,
    registry: Arc<ToolRegistry>,
    config: AssistantConfig,
    event_tx: broadcast::Sender<WorkflowEvent>,
}

impl Workflow {
    pub fn new(
        graph: Graph,
        engine: Arc<dyn ReasoningEngine>,
        registry: Arc<ToolRegistry>,
        config: AssistantConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            graph,
            engine,
            registry,
            config,
            event_tx,
        }
    }

    pub fn standard(
        engine: Arc<dyn ReasoningEngine>,
        registry: Arc<ToolRegistry>,
        config: AssistantConfig,
    ) -> Result<Self> {
        Ok(Self::new(standard_graph()?, engine, registry, config))
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_tx.subscribe()
    }

    pub fn engine(&self) -> &Arc<dyn ReasoningEngine> {
        &self.engine
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Run one message through the graph. `state` must already hold the
    /// turn's input (see [`ConversationState::begin_turn`]).
    pub async fn run(&self, state: &mut ConversationState) -> Result<()> {
        let _ = self.event_tx.send(WorkflowEvent::TurnStart {
            session_id: state.session_id.clone(),
        });
        match self.walk(state).await {
            Ok(()) => {
                let _ = self.event_tx.send(WorkflowEvent::TurnEnd {
                    session_id: state.session_id.clone(),
                    tools_used: state.tools_used.clone(),
                });
                Ok(())
            }
            Err(e) => {
                let _ = self.event_tx.send(WorkflowEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn walk(&self, state: &mut ConversationState) -> Result<()> {
        let mut node = self.graph.entry();
        // Acyclic, so every node runs at most once
        let mut remaining = self.graph.transitions.len() + 1;
        while node != Node::End {
            if remaining == 0 {
                return Err(Error::InvalidGraph("step limit exceeded".into()));
            }
            remaining -= 1;

            debug!(node = node.label(), session = %state.session_id, "Entering node");
            let _ = self.event_tx.send(WorkflowEvent::NodeStart {
                node: node.label().to_string(),
            });
            self.execute(node, state).await?;
            node = self.graph.next(node, state)?;
        }
        Ok(())
    }

    async fn execute(&self, node: Node, state: &mut ConversationState) -> Result<()> {
        let deps = TaskDeps {
            engine: &self.engine,
            registry: &self.registry,
            config: &self.config,
            events: &self.event_tx,
        };
        match node {
            Node::Classify => {
                let history = render_history(
                    &state.conversation_history,
                    self.config.history_turns,
                    &state.conversation_summary,
                );
                let intent = classify_intent(
                    self.engine.as_ref(),
                    &state.user_input,
                    &history,
                    self.config.engine_timeout,
                )
                .await?;
                let route = route_for(intent.intent_type);
                let _ = self.event_tx.send(WorkflowEvent::IntentClassified {
                    intent_type: intent.intent_type,
                    confidence: intent.confidence,
                    route: route.label().to_string(),
                });
                state.intent = Some(intent);
                state.next_route = Some(route);
                Ok(())
            }
            Node::Qa => run_task(&QaTask, &deps, state).await,
            Node::Summarize => run_task(&SummarizationTask, &deps, state).await,
            Node::Calculate => run_task(&CalculationTask, &deps, state).await,
            Node::UpdateMemory => update_memory(state),
            Node::End => Ok(()),
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("graph", &self.graph)
            .field("registry", &self.registry)
            .finish()
    }
}
