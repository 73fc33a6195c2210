//! Session flow coordinator.
//!
//! Routes every interaction through analysis, persona, mood, topic and
//! timeline processing and merges the results into one `SessionState` and
//! `SessionContext`. A turn is computed synchronously on a private copy of the
//! session runtime; the copy, the deferred topic-graph writes and the new
//! session snapshot are committed together at the end. Persistence runs after
//! the commit and never fails a turn.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kindred_types::config::KindredConfig;
use kindred_types::emotion::{ContextKind, EmotionalContext};
use kindred_types::error::SessionError;
use kindred_types::mood::MoodState;
use kindred_types::persona::{Persona, PersonaContext, PersonaEvent, ResponseStyle};
use kindred_types::session::{
    InitialContext, Interaction, Session, SessionCheckpoint, SessionContext, SessionId,
    SessionState, Subsystem, TurnOutcome,
};
use kindred_types::timeline::{
    EventType, MemoryEvent, MemoryEventDraft, RecallQuery, ScoredMemory,
};
use kindred_types::topic::{ContextTransition, RelationUpdate, UNCATEGORIZED_TOPIC};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzer::EmotionalAnalyzer;
use crate::normalize::BiasHandler;
use crate::repository::{MemoryEventRepository, SessionStateRepository, TopicRepository};
use crate::topic::TopicGraph;

use super::checkpoint::{CheckpointPolicy, SignificantChangePolicy};
use super::runtime::{Catalogs, SessionRuntime};

/// How many persisted events are loaded into a fresh runtime.
const HYDRATE_EVENT_LIMIT: usize = 200;

/// Keywords shorter than this are too generic to drive recall.
const MIN_RECALL_KEYWORD_LEN: usize = 4;

struct Slot {
    session: Session,
    runtime: SessionRuntime,
}

/// Everything a turn produced, applied in one step by `commit`.
struct TurnPlan {
    session: Session,
    runtime: SessionRuntime,
    relation_updates: Vec<RelationUpdate>,
    touched_topics: Vec<String>,
    events: Vec<MemoryEvent>,
    checkpoint: Option<SessionCheckpoint>,
}

/// Orchestrates session lifecycle and per-turn processing.
///
/// Generic over the persistence ports so kindred-core never depends on
/// kindred-infra.
pub struct SessionCoordinator<S, T, M, P = SignificantChangePolicy>
where
    S: SessionStateRepository,
    T: TopicRepository,
    M: MemoryEventRepository,
    P: CheckpointPolicy,
{
    config: Arc<KindredConfig>,
    catalogs: Catalogs,
    analyzer: EmotionalAnalyzer,
    bias: BiasHandler,
    graph: Arc<TopicGraph>,
    sessions: DashMap<SessionId, Arc<Mutex<Slot>>>,
    latest_by_user: DashMap<String, SessionId>,
    /// Ended sessions still held for continuation, oldest first.
    ended: Mutex<VecDeque<(SessionId, String)>>,
    state_repo: S,
    topic_repo: T,
    memory_repo: M,
    policy: P,
}

impl<S, T, M> SessionCoordinator<S, T, M, SignificantChangePolicy>
where
    S: SessionStateRepository,
    T: TopicRepository,
    M: MemoryEventRepository,
{
    /// Create a coordinator with the default checkpoint policy.
    pub fn new(config: KindredConfig, state_repo: S, topic_repo: T, memory_repo: M) -> Self {
        let policy = SignificantChangePolicy {
            intensity_delta: config.session.intensity_checkpoint_delta,
        };
        Self::with_policy(config, state_repo, topic_repo, memory_repo, policy)
    }
}

impl<S, T, M, P> SessionCoordinator<S, T, M, P>
where
    S: SessionStateRepository,
    T: TopicRepository,
    M: MemoryEventRepository,
    P: CheckpointPolicy,
{
    pub fn with_policy(
        config: KindredConfig,
        state_repo: S,
        topic_repo: T,
        memory_repo: M,
        policy: P,
    ) -> Self {
        let catalogs = Catalogs::from_config(&config);
        Self {
            config: Arc::new(config),
            catalogs,
            analyzer: EmotionalAnalyzer::new(),
            bias: BiasHandler::new(),
            graph: Arc::new(TopicGraph::new()),
            sessions: DashMap::new(),
            latest_by_user: DashMap::new(),
            ended: Mutex::new(VecDeque::new()),
            state_repo,
            topic_repo,
            memory_repo,
            policy,
        }
    }

    pub fn config(&self) -> &KindredConfig {
        &self.config
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// The process-wide topic graph.
    pub fn graph(&self) -> &Arc<TopicGraph> {
        &self.graph
    }

    /// Access the session state repository.
    pub fn state_repo(&self) -> &S {
        &self.state_repo
    }

    /// Access the topic repository.
    pub fn topic_repo(&self) -> &T {
        &self.topic_repo
    }

    /// Access the memory event repository.
    pub fn memory_repo(&self) -> &M {
        &self.memory_repo
    }

    /// Number of sessions held in memory, active or ended.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn slot(&self, id: &SessionId) -> Result<Arc<Mutex<Slot>>, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NoActiveSession(id.to_string()))
    }

    // --- Session lifecycle ---

    /// Open a session for `user_id`, continuing the user's latest session if
    /// one exists in memory or in persistence.
    pub async fn start_session(
        &self,
        user_id: &str,
        initial: InitialContext,
    ) -> Result<Session, SessionError> {
        let now = Utc::now();
        let id = SessionId::new();

        let (mut runtime, mut state, continued_from) = match self.in_memory_predecessor(user_id) {
            Some((previous_id, slot)) => {
                let mut previous = slot.lock().await;
                if previous.session.is_active() {
                    previous.session.ended_at = Some(now);
                }
                let inherited = (
                    previous.runtime.clone(),
                    previous.session.state.clone(),
                    Some(previous_id),
                );
                drop(previous);
                self.release(&previous_id).await;
                inherited
            }
            None => match self.persisted_predecessor(user_id).await {
                Some((previous_id, state)) => {
                    let mut runtime =
                        SessionRuntime::from_state(&self.config, &self.catalogs, &state, now);
                    self.hydrate_events(user_id, &mut runtime).await;
                    (runtime, state, Some(previous_id))
                }
                None => {
                    let mut runtime = SessionRuntime::new(&self.config, &self.catalogs, now);
                    self.hydrate_events(user_id, &mut runtime).await;
                    (runtime, SessionState::fresh(now), None)
                }
            },
        };

        let mut persona_events = Vec::new();
        if let Some(persona_id) = &initial.persona_id {
            if runtime.persona.current_persona_id() != Some(persona_id.as_str()) {
                persona_events.push(runtime.persona.switch_persona(
                    persona_id,
                    "session start",
                    now,
                )?);
            }
        }

        if !initial.topics.is_empty() {
            for topic in &initial.topics {
                self.hydrate_topic(topic).await;
            }
            runtime.threader.restore(&initial.topics, now);
        }

        state.persona_id = runtime.persona.current_persona_id().map(str::to_string);
        state.main_topic = runtime.threader.main_topic();
        state.active_topics = runtime.threader.current_topics();
        if state.relationship.is_none() {
            state.relationship = runtime.timeline.relationship(user_id).cloned();
        }

        let session = Session {
            id,
            user_id: user_id.to_string(),
            started_at: now,
            last_active: now,
            ended_at: None,
            state,
            context: SessionContext {
                persona_events,
                restrictions: initial.restrictions,
                metadata: initial.metadata,
                ..Default::default()
            },
            active_systems: Subsystem::ALL.into_iter().collect(),
            checkpoints: Vec::new(),
            continued_from,
        };

        match continued_from {
            Some(previous) => {
                info!(session_id = %id, %previous, user_id, "Session continued")
            }
            None => info!(session_id = %id, user_id, "Session started"),
        }

        self.persist_state(&session).await;
        self.sessions.insert(
            id,
            Arc::new(Mutex::new(Slot {
                session: session.clone(),
                runtime,
            })),
        );
        self.latest_by_user.insert(user_id.to_string(), id);
        Ok(session)
    }

    fn in_memory_predecessor(&self, user_id: &str) -> Option<(SessionId, Arc<Mutex<Slot>>)> {
        let previous_id = *self.latest_by_user.get(user_id)?;
        let slot = self.slot(&previous_id).ok()?;
        Some((previous_id, slot))
    }

    async fn persisted_predecessor(&self, user_id: &str) -> Option<(SessionId, SessionState)> {
        let previous_id = match self.state_repo.latest_session_for_user(user_id).await {
            Ok(found) => found?,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to look up latest session");
                return None;
            }
        };
        match self.state_repo.load_session_state(&previous_id).await {
            Ok(state) => state.map(|state| (previous_id, state)),
            Err(e) => {
                warn!(session_id = %previous_id, error = %e, "Failed to load session state");
                None
            }
        }
    }

    async fn hydrate_events(&self, user_id: &str, runtime: &mut SessionRuntime) {
        match self
            .memory_repo
            .list_memory_events(user_id, HYDRATE_EVENT_LIMIT)
            .await
        {
            Ok(events) => {
                debug!(user_id, count = events.len(), "Loaded memory events");
                for event in events.into_iter().rev() {
                    runtime.timeline.hydrate(event);
                }
            }
            Err(e) => warn!(user_id, error = %e, "Failed to load memory events"),
        }
    }

    async fn hydrate_topic(&self, topic: &str) {
        if self.graph.contains(topic) {
            return;
        }
        match self.topic_repo.load_topic(topic).await {
            Ok(Some(data)) => self.graph.hydrate(&data),
            Ok(None) => {}
            Err(e) => warn!(topic, error = %e, "Failed to load topic"),
        }
    }

    /// Mark a session ended. Its state stays available for continuation.
    pub async fn end_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        if !guard.session.is_active() {
            return Err(SessionError::NoActiveSession(id.to_string()));
        }
        guard.session.ended_at = Some(Utc::now());
        info!(session_id = %id, turns = guard.session.state.turn_count, "Session ended");
        let session = guard.session.clone();
        drop(guard);
        self.persist_state(&session).await;
        self.retire(session.id, &session.user_id).await;
        Ok(session)
    }

    /// Drop a continued session from memory. Its successor owns the runtime.
    async fn release(&self, id: &SessionId) {
        self.sessions.remove(id);
        self.ended.lock().await.retain(|(ended, _)| ended != id);
    }

    /// Queue an ended session and evict the oldest ones beyond the cap.
    /// Evicted users continue from persistence instead.
    async fn retire(&self, id: SessionId, user_id: &str) {
        let mut ended = self.ended.lock().await;
        ended.push_back((id, user_id.to_string()));
        while ended.len() > self.config.session.max_ended_sessions {
            let Some((old, user)) = ended.pop_front() else {
                break;
            };
            self.sessions.remove(&old);
            self.latest_by_user.remove_if(&user, |_, latest| *latest == old);
            debug!(session_id = %old, user_id = %user, "Evicted ended session");
        }
    }

    /// Snapshot of a session, active or ended.
    pub async fn session(&self, id: &SessionId) -> Result<Session, SessionError> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        Ok(guard.session.clone())
    }

    // --- Turn processing ---

    /// Process one user turn and return the merged state and context.
    pub async fn process_interaction(
        &self,
        id: &SessionId,
        interaction: Interaction,
    ) -> Result<TurnOutcome, SessionError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        if !guard.session.is_active() {
            return Err(SessionError::NoActiveSession(id.to_string()));
        }

        let now = interaction.timestamp.unwrap_or_else(Utc::now);
        let plan = self.plan_turn(&guard.session, &guard.runtime, &interaction, now)?;
        let events = plan.events.clone();
        let touched = plan.touched_topics.clone();
        let checkpoint = plan.checkpoint.clone();
        self.commit(&mut guard, plan);

        let session = guard.session.clone();
        drop(guard);

        self.persist_state(&session).await;
        self.persist_topics(&touched).await;
        self.persist_events(&session.user_id, &events).await;

        Ok(TurnOutcome {
            session_id: session.id,
            state: session.state,
            context: session.context,
            checkpoint,
        })
    }

    /// Compute a turn on a copy of the runtime. Nothing shared is mutated.
    fn plan_turn(
        &self,
        session: &Session,
        runtime: &SessionRuntime,
        interaction: &Interaction,
        now: DateTime<Utc>,
    ) -> Result<TurnPlan, SessionError> {
        let mut runtime = runtime.clone();
        let user_id = session.user_id.as_str();
        let ctx = Arc::new(self.analyzer.analyze(
            &interaction.message,
            interaction.user_mood.as_deref(),
            now,
        ));
        debug!(
            session_id = %session.id,
            sentiment = ctx.sentiment,
            intensity = ctx.intensity,
            context = %ctx.primary_context,
            "Message analyzed"
        );

        // Persona
        let mut persona_events: Vec<PersonaEvent> = Vec::new();
        if let Some(target) = &interaction.persona_request {
            persona_events.push(runtime.persona.switch_persona(target, "requested", now)?);
        } else if let Some(suggestion) = runtime.persona.suggest_transition(&ctx) {
            let suggestion = suggestion.to_string();
            if runtime.persona.current_persona_id() != Some(suggestion.as_str()) {
                let reason = format!("{} context", ctx.primary_context);
                match runtime.persona.switch_persona(&suggestion, &reason, now) {
                    Ok(event) => persona_events.push(event),
                    Err(e) => debug!(persona = %suggestion, error = %e, "Persona suggestion skipped"),
                }
            }
        }

        // Mood, bias and normalization
        let previous_main_topic = runtime.threader.main_topic();
        let previous_intensity = runtime.mood.current().intensity;
        runtime.mood.update(&ctx);
        let biased = self.bias.apply(
            runtime.mood.last_scores(),
            &ctx,
            runtime.persona.current_persona(),
        );
        let mood_scores = runtime.normalizer.normalize(&biased, &ctx);

        // Topics
        let topic_update = runtime.threader.process_input(&interaction.message, &ctx, &self.graph);
        let integrations = runtime
            .integrator
            .integrate(&topic_update.detections, &ctx, &mut runtime.mood);
        for integration in &integrations {
            debug!(
                domain = %integration.domain,
                modifier = integration.modifier,
                integrated = integration.integrated_intensity,
                "Topic-mood integration applied"
            );
        }
        let mood = runtime.mood.current().clone();

        let main_topic = runtime.threader.main_topic();
        let mut transitions = Vec::new();
        if let (Some(from), Some(to)) = (&previous_main_topic, &main_topic) {
            if from != to {
                transitions.push(ContextTransition {
                    from_topic: from.clone(),
                    to_topic: to.clone(),
                    mood: mood.primary_mood.clone(),
                    intensity_delta: mood.intensity - previous_intensity,
                    timestamp: now,
                });
            }
        }
        let active_topics = runtime.threader.current_topics();

        // Timeline: recall before storing so a turn never recalls itself.
        let query = recall_query(&ctx, &active_topics, user_id, &mood);
        let recalled = runtime.timeline.recall_memories(
            &query,
            self.config.timeline.recall_limit,
            now,
        );
        let mut events: Vec<MemoryEvent> = recalled.iter().map(|r| r.event.clone()).collect();
        let mut new_markers = Vec::new();

        let mut drafts: Vec<MemoryEventDraft> = topic_update
            .archived
            .iter()
            .map(|thread| {
                let topics: Vec<String> = thread.active_topics.iter().cloned().collect();
                let mut draft = MemoryEventDraft::new(
                    EventType::Conversation,
                    format!("talked about {}", topics.join(", ")),
                    thread.last_active,
                );
                draft.tags = topics.clone();
                draft.context.participants = vec![user_id.to_string()];
                draft.context.topics = topics;
                draft
            })
            .collect();
        if let Some(draft) = turn_event(&ctx, &active_topics, user_id, &mood) {
            drafts.push(draft);
        }
        for draft in drafts {
            let stored = runtime.timeline.store_event(draft, now);
            if let Some(marker) = stored.marker {
                new_markers.push(marker);
            }
            events.push(stored.event);
        }

        // Merge
        let previous_state = &session.state;
        let state = SessionState {
            mood,
            persona_id: runtime.persona.current_persona_id().map(str::to_string),
            main_topic,
            active_topics,
            relationship: runtime
                .timeline
                .relationship(user_id)
                .cloned()
                .or_else(|| previous_state.relationship.clone()),
            turn_count: previous_state.turn_count + 1,
            last_interaction: Some(now),
        };

        let persona_context = PersonaContext::from_emotional(&ctx, &session.context.restrictions);
        let mut context_stack = session.context.context_stack.clone();
        context_stack.push(ctx.primary_context);
        let depth = self.config.session.context_stack_depth;
        if context_stack.len() > depth {
            context_stack.drain(..context_stack.len() - depth);
        }

        let context = SessionContext {
            emotional: Some((*ctx).clone()),
            mood_scores,
            response_style: runtime.persona.get_response_style(&persona_context),
            detections: topic_update.detections.clone(),
            recalled,
            new_markers,
            transitions,
            persona_events,
            context_stack,
            restrictions: session.context.restrictions.clone(),
            metadata: session.context.metadata.clone(),
        };

        let reasons = self
            .policy
            .significant_changes(previous_state, &state, &context);
        let checkpoint = (!reasons.is_empty()).then(|| SessionCheckpoint {
            id: Uuid::now_v7(),
            timestamp: now,
            state: state.clone(),
            reasons,
        });

        let mut next = session.clone();
        next.state = state;
        next.context = context;
        next.last_active = now;
        if let Some(checkpoint) = &checkpoint {
            next.checkpoints.push(checkpoint.clone());
            let max = self.config.session.max_checkpoints;
            if next.checkpoints.len() > max {
                let excess = next.checkpoints.len() - max;
                next.checkpoints.drain(..excess);
            }
        }

        let mut touched_topics: Vec<String> = topic_update
            .detections
            .iter()
            .map(|d| d.domain.clone())
            .collect();
        for update in &topic_update.relation_updates {
            for topic in [&update.a, &update.b] {
                if !touched_topics.contains(topic) {
                    touched_topics.push(topic.clone());
                }
            }
        }

        Ok(TurnPlan {
            session: next,
            runtime,
            relation_updates: topic_update.relation_updates,
            touched_topics,
            events,
            checkpoint,
        })
    }

    fn commit(&self, slot: &mut Slot, plan: TurnPlan) {
        let now = plan.session.last_active;
        let mood = &plan.session.state.mood;
        for topic in &plan.touched_topics {
            self.graph.touch(topic, now);
            self.graph
                .record_mood(topic, &mood.primary_mood, mood.intensity, now);
        }
        self.graph.apply(&plan.relation_updates);

        if let Some(checkpoint) = &plan.checkpoint {
            info!(
                session_id = %plan.session.id,
                reasons = ?checkpoint.reasons,
                "Checkpoint recorded"
            );
        }
        debug!(
            session_id = %plan.session.id,
            mood = %mood.primary_mood,
            intensity = mood.intensity,
            persona = ?plan.session.state.persona_id,
            "Turn committed"
        );

        slot.runtime = plan.runtime;
        slot.session = plan.session;
    }

    // --- Queries and explicit operations ---

    /// Evaluate the active persona's style rules against `context`.
    pub async fn get_response_style(
        &self,
        id: &SessionId,
        context: &PersonaContext,
    ) -> Result<ResponseStyle, SessionError> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        Ok(guard.runtime.persona.get_response_style(context))
    }

    pub async fn current_mood(&self, id: &SessionId) -> Result<MoodState, SessionError> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        Ok(guard.runtime.mood.current().clone())
    }

    pub async fn current_persona(&self, id: &SessionId) -> Result<Option<Persona>, SessionError> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        Ok(guard.runtime.persona.current_persona().cloned())
    }

    /// Explicit persona switch outside of a turn.
    pub async fn switch_persona(
        &self,
        id: &SessionId,
        target: &str,
        reason: &str,
    ) -> Result<PersonaEvent, SessionError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        if !guard.session.is_active() {
            return Err(SessionError::NoActiveSession(id.to_string()));
        }
        let event = guard.runtime.persona.switch_persona(target, reason, Utc::now())?;
        guard.session.state.persona_id = Some(event.to.clone());
        guard.session.context.persona_events.push(event.clone());
        let session = guard.session.clone();
        drop(guard);
        self.persist_state(&session).await;
        Ok(event)
    }

    /// Recall memories for the session's user.
    pub async fn recall_memories(
        &self,
        id: &SessionId,
        query: &RecallQuery,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>, SessionError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        let recalled = guard.runtime.timeline.recall_memories(query, limit, Utc::now());
        let user_id = guard.session.user_id.clone();
        drop(guard);
        let events: Vec<MemoryEvent> = recalled.iter().map(|r| r.event.clone()).collect();
        self.persist_events(&user_id, &events).await;
        Ok(recalled)
    }

    /// Topics related to the session's active topics, strongest first,
    /// excluding topics already active.
    pub async fn suggest_related_topics(
        &self,
        id: &SessionId,
        min_strength: f64,
    ) -> Result<Vec<(String, f64)>, SessionError> {
        let slot = self.slot(id)?;
        let active = {
            let guard = slot.lock().await;
            guard.runtime.threader.current_topics()
        };

        let mut related: BTreeMap<String, f64> = BTreeMap::new();
        for topic in active.iter().filter(|t| t.as_str() != UNCATEGORIZED_TOPIC) {
            let mut neighbors = self.graph.neighbors(topic, min_strength);
            if neighbors.is_empty() {
                neighbors = match self.topic_repo.query_related_topics(topic, min_strength).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "Failed to query related topics");
                        Vec::new()
                    }
                };
            }
            for (other, strength) in neighbors {
                if active.contains(&other) {
                    continue;
                }
                let entry = related.entry(other).or_insert(0.0);
                *entry = entry.max(strength);
            }
        }

        let mut out: Vec<(String, f64)> = related.into_iter().collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    // --- Persistence (best effort) ---

    async fn persist_state(&self, session: &Session) {
        if let Err(e) = self
            .state_repo
            .save_session_state(&session.id, &session.user_id, &session.state)
            .await
        {
            warn!(session_id = %session.id, error = %e, "Failed to save session state");
        }
    }

    async fn persist_topics(&self, topics: &[String]) {
        for topic in topics {
            let keywords = self
                .catalogs
                .domain_rules
                .iter()
                .find(|r| &r.domain == topic)
                .map(|r| r.keywords.clone())
                .unwrap_or_default();
            let Some(data) = self.graph.to_topic_data(topic, topic, &keywords) else {
                continue;
            };
            if let Err(e) = self.topic_repo.save_topic(&data).await {
                warn!(topic = %topic, error = %e, "Failed to save topic");
            }
        }
    }

    async fn persist_events(&self, user_id: &str, events: &[MemoryEvent]) {
        for event in events {
            if let Err(e) = self.memory_repo.append_memory_event(user_id, event).await {
                warn!(user_id, event_id = %event.id, error = %e, "Failed to save memory event");
            }
        }
    }
}

fn recall_query(
    ctx: &EmotionalContext,
    active_topics: &[String],
    user_id: &str,
    mood: &MoodState,
) -> RecallQuery {
    RecallQuery {
        topics: active_topics
            .iter()
            .filter(|t| t.as_str() != UNCATEGORIZED_TOPIC)
            .cloned()
            .collect(),
        keywords: ctx
            .keywords
            .iter()
            .filter(|k| k.chars().count() >= MIN_RECALL_KEYWORD_LEN)
            .cloned()
            .collect(),
        participants: vec![user_id.to_string()],
        mood: Some(mood.primary_mood.clone()),
    }
}

/// Emotional and romantic turns become memories; everything else is noise.
fn turn_event(
    ctx: &EmotionalContext,
    active_topics: &[String],
    user_id: &str,
    mood: &MoodState,
) -> Option<MemoryEventDraft> {
    let event_type = if ctx.has_context(ContextKind::Emotional) {
        EventType::Emotional
    } else if ctx.has_context(ContextKind::Romantic) {
        EventType::Relationship
    } else {
        return None;
    };

    let mut draft = MemoryEventDraft::new(event_type, ctx.raw_input.trim(), ctx.timestamp);
    draft
        .emotions
        .insert(ctx.primary_emotion.clone(), ctx.intensity);
    draft.emotions.insert(mood.primary_mood.clone(), mood.intensity);
    draft.tags = vec![ctx.category.to_string(), ctx.emotional_tone.clone()];
    draft.context.participants = vec![user_id.to_string()];
    draft.context.mood = Some(mood.primary_mood.clone());
    draft.context.topics = active_topics
        .iter()
        .filter(|t| t.as_str() != UNCATEGORIZED_TOPIC)
        .cloned()
        .collect();
    Some(draft)
}
