//! The autonomous player.
//!
//! An [`AiPlayer`] is the [`ClientHandler`] for one computer-controlled
//! player. Every server push goes through the same two steps:
//!
//! 1. **Decide**, synchronously, on the dispatch loop: the policy runs
//!    against a read-only game snapshot and the player's own generator.
//! 2. **Respond**, on a freshly spawned task: the answer is sent through
//!    the player's [`ServerApi`] and the task waits for the reply.
//!
//! The dispatch loop therefore never waits on the network, and replies
//! for different notifications may complete in any order. A panic in
//! either step, or a failed round trip, is logged and confined to that
//! one notification.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tradewind_api::{AiHooks, ApiError, ServerApi, ServerApiConfig};
use tradewind_protocol::{
    ChooseFoundingFather, ClientHandler, Diplomacy, Emigrate, FirstContact, FountainOfYouth,
    IndianDemand, LootCargo, Message, MonarchActionMessage, NationSummary, NationSummaryMessage,
    NativeTradeMessage, NewLandName, ObjectId, PlayerId, ProtocolError, SharedGame, TradeStatus,
};
use tradewind_transport::Connection;
use tracing::{debug, error, info, trace, warn};

use crate::loot::{Market, select_loot};
use crate::{AiConfig, AiError, AiPlayerState, AiPolicy, AiRng, DecisionContext};

/// Handle to one spawned response.
pub type Invocation = JoinHandle<Result<(), AiError>>;

/// A computer-controlled player.
pub struct AiPlayer<C: Connection, P: AiPolicy> {
    player: PlayerId,
    api: Arc<ServerApi<C, AiHooks>>,
    policy: P,
    rng: Mutex<AiRng>,
    /// What this player knows about others. Never shared.
    summaries: Mutex<HashMap<PlayerId, NationSummary>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<C: Connection, P: AiPolicy> AiPlayer<C, P> {
    /// Attaches a new autonomous player to `player`, which must exist in
    /// `game`. The generator is seeded from `config` and the player id.
    ///
    /// # Errors
    /// [`AiError::Protocol`] if the player is not in the game.
    pub fn new(
        player: PlayerId,
        connection: Arc<C>,
        game: SharedGame,
        policy: P,
        config: &AiConfig,
        api_config: ServerApiConfig,
    ) -> Result<Self, AiError> {
        let rng = AiRng::for_player(config.master_seed, &player);
        Self::build(player, connection, game, policy, rng, api_config)
    }

    /// Recreates a saved player.
    ///
    /// # Errors
    /// [`AiError::Protocol`] if the player is not in the game or the saved
    /// random state is malformed.
    pub fn restore(
        state: &AiPlayerState,
        connection: Arc<C>,
        game: SharedGame,
        policy: P,
        config: &AiConfig,
        api_config: ServerApiConfig,
    ) -> Result<Self, AiError> {
        let rng = match state.rng()? {
            Some(rng) => rng,
            None => {
                debug!(player = %state.player_id, "no saved random state, reseeding");
                AiRng::for_player(config.master_seed, &state.player_id)
            }
        };
        Self::build(state.player_id.clone(), connection, game, policy, rng, api_config)
    }

    fn build(
        player: PlayerId,
        connection: Arc<C>,
        game: SharedGame,
        policy: P,
        rng: AiRng,
        api_config: ServerApiConfig,
    ) -> Result<Self, AiError> {
        lock_read(&game).require_player(&player)?;
        let hooks = AiHooks::new(player.clone());
        let api = ServerApi::new(connection, hooks, game, api_config);
        info!(%player, "autonomous player attached");
        Ok(Self {
            player,
            api: Arc::new(api),
            policy,
            rng: Mutex::new(rng),
            summaries: Mutex::new(HashMap::new()),
        })
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn api(&self) -> &Arc<ServerApi<C, AiHooks>> {
        &self.api
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Snapshot for a save document.
    pub fn save(&self) -> AiPlayerState {
        AiPlayerState {
            player_id: self.player.clone(),
            random_state: Some(lock(&self.rng).to_string()),
        }
    }

    /// Last known summary of `other`.
    pub fn nation_summary(&self, other: &PlayerId) -> Option<NationSummary> {
        lock(&self.summaries).get(other).cloned()
    }

    /// Runs a policy decision against the current game snapshot.
    ///
    /// Returns `None` if the policy panicked; the panic is logged.
    fn decide<R>(
        &self,
        task: &'static str,
        f: impl FnOnce(&P, &mut DecisionContext<'_>) -> R,
    ) -> Option<R> {
        let game = lock_read(self.api.game());
        let mut rng = lock(&self.rng);
        let mut ctx = DecisionContext {
            player: &self.player,
            game: &*game,
            rng: &mut *rng,
        };
        match catch_unwind(AssertUnwindSafe(|| f(&self.policy, &mut ctx))) {
            Ok(decision) => Some(decision),
            Err(panic) => {
                error!(
                    player = %self.player,
                    task,
                    panic = %panic_message(&*panic),
                    "decision panicked"
                );
                None
            }
        }
    }

    /// Spawns `work` as the response to one notification.
    ///
    /// Errors and panics inside `work` are logged with the task name and
    /// returned through the handle; nothing escapes to the caller.
    pub fn invoke<F>(&self, task: &'static str, work: F) -> Invocation
    where
        F: Future<Output = Result<(), AiError>> + Send + 'static,
    {
        let player = self.player.clone();
        tokio::spawn(async move {
            trace!(%player, task, "response started");
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(AiError::TaskPanicked {
                    task,
                    message: panic_message(&*panic),
                }),
            };
            match &result {
                Ok(()) => trace!(%player, task, "response finished"),
                Err(e) => error!(%player, task, error = %e, "response failed"),
            }
            result
        })
    }

    /// Sends `request` on its own task.
    fn ask(&self, task: &'static str, request: impl Into<Message>) -> Invocation {
        let api = self.api.clone();
        let request = request.into();
        self.invoke(task, async move { complete(&api, request).await })
    }

    pub fn choose_founding_father_handler(&self, offer: ChooseFoundingFather) -> Option<Invocation> {
        let chosen = self
            .decide("chooseFoundingFather", |p, ctx| {
                p.select_founding_father(ctx, &offer.fathers)
            })
            .flatten()?;
        Some(self.ask("chooseFoundingFather", offer.choose(chosen)))
    }

    /// Answers proposals only; other statuses need no response.
    pub fn diplomacy_handler(&self, message: Diplomacy) -> Option<Invocation> {
        let Diplomacy {
            our,
            other,
            mut agreement,
        } = message;
        if agreement.status != TradeStatus::Propose {
            debug!(player = %self.player, status = %agreement.status, "ignoring diplomacy");
            return None;
        }
        agreement.status = self.decide("diplomacy", |p, ctx| {
            p.accept_diplomatic_trade(ctx, &agreement)
        })?;
        debug!(player = %self.player, status = %agreement.status, "diplomacy decided");
        // Our answer is in our own sense, so the parties swap.
        Some(self.ask(
            "diplomacy",
            Diplomacy {
                our: other,
                other: our,
                agreement,
            },
        ))
    }

    pub fn first_contact_handler(&self, contact: FirstContact) -> Option<Invocation> {
        Some(self.ask(
            "firstContact",
            FirstContact {
                result: Some(true),
                ..contact
            },
        ))
    }

    /// Takes every free migrant, one request at a time.
    pub fn fountain_of_youth_handler(&self, message: FountainOfYouth) -> Option<Invocation> {
        let api = self.api.clone();
        Some(self.invoke("fountainOfYouth", async move {
            for _ in 0..message.migrants {
                complete(&api, Emigrate { slot: 0 }.into()).await?;
            }
            Ok(())
        }))
    }

    pub fn indian_demand_handler(&self, demand: IndianDemand) -> Option<Invocation> {
        let result = self
            .decide("indianDemand", |p, ctx| p.indian_demand(ctx, &demand))
            .flatten();
        trace!(
            player = %self.player,
            unit = %demand.unit,
            colony = %demand.colony,
            ?result,
            "native demand"
        );
        let result = result?;
        Some(self.ask(
            "indianDemand",
            IndianDemand {
                result: Some(result),
                ..demand
            },
        ))
    }

    /// Picks the most valuable cargo that fits and claims it.
    pub fn loot_cargo_handler(&self, offer: LootCargo) -> Option<Invocation> {
        let loot = self.decide("lootCargo", |_, ctx| {
            let market = ctx.player_object().map(Market::from_player).unwrap_or_default();
            let space = unit_space_left(ctx, &offer.winner)?;
            Ok::<_, ProtocolError>(select_loot(&offer.goods, &market, space))
        })?;
        let loot = match loot {
            Ok(loot) => loot,
            Err(e) => {
                warn!(player = %self.player, winner = %offer.winner, error = %e, "cannot weigh loot");
                return None;
            }
        };
        Some(self.ask("lootCargo", LootCargo { goods: loot, ..offer }))
    }

    pub fn monarch_action_handler(&self, message: MonarchActionMessage) -> Option<Invocation> {
        let action = message.action;
        let accept = if action.is_tax_raise() {
            let tax = message.tax.unwrap_or(0);
            self.decide("monarchAction", |p, ctx| p.accept_tax(ctx, tax))?
        } else if action.is_mercenary_offer() {
            self.decide("monarchAction", |p, ctx| p.accept_mercenaries(ctx))?
        } else {
            trace!(player = %self.player, %action, "ignoring monarch action");
            return None;
        };
        trace!(player = %self.player, %action, accept, "monarch action decided");
        Some(self.ask(
            "monarchAction",
            MonarchActionMessage {
                result: Some(accept),
                ..message
            },
        ))
    }

    /// Records the summary privately. Nothing is sent.
    pub fn nation_summary_handler(&self, message: NationSummaryMessage) -> Option<Invocation> {
        info!(player = %self.player, other = %message.player, "updated nation summary");
        lock(&self.summaries).insert(message.player, message.summary);
        None
    }

    pub fn native_trade_handler(&self, message: NativeTradeMessage) -> Option<Invocation> {
        let action = self.decide("nativeTrade", |p, ctx| {
            p.handle_trade(ctx, message.action, &message.trade)
        })?;
        Some(self.ask(
            "nativeTrade",
            NativeTradeMessage {
                action,
                trade: message.trade,
            },
        ))
    }

    /// Accepts the suggested name.
    pub fn new_land_name_handler(&self, message: NewLandName) -> Option<Invocation> {
        Some(self.ask("newLandName", message))
    }

    /// Issues this turn's requests in order, waiting for each reply.
    /// Complaints are logged by the hooks and do not stop the turn.
    ///
    /// # Errors
    /// The first transport failure.
    pub async fn start_working(&self) -> Result<(), AiError> {
        let requests = self
            .decide("startWorking", |p, ctx| p.start_working(ctx))
            .unwrap_or_default();
        debug!(player = %self.player, requests = requests.len(), "starting turn");
        for request in requests {
            complete(&self.api, request).await?;
        }
        Ok(())
    }

    /// Abandons outstanding requests and closes the connection.
    pub async fn shutdown(&self) -> Result<(), AiError> {
        info!(player = %self.player, "autonomous player shutting down");
        self.api.shutdown().await?;
        Ok(())
    }
}

impl<C: Connection, P: AiPolicy> AiPlayer<C, P> {
    /// Runs the dispatch loop for this player on its own task.
    pub fn spawn_dispatch(self: &Arc<Self>) -> Invocation {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            let result = me.api.run(&*me).await;
            info!(player = %me.player, "dispatch loop ended");
            result.map_err(AiError::from)
        })
    }
}

/// Sends one request and waits for it. A complaint has already been
/// surfaced by the hooks and counts as done.
async fn complete<C: Connection>(
    api: &ServerApi<C, AiHooks>,
    request: Message,
) -> Result<(), AiError> {
    match api.send(request).await {
        Ok(_) | Err(ApiError::Complaint(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn lock_read(game: &SharedGame) -> std::sync::RwLockReadGuard<'_, tradewind_protocol::Game> {
    game.read().unwrap_or_else(PoisonError::into_inner)
}

/// Free cargo slots on `unit`, from its `spaceLeft` attribute.
fn unit_space_left(ctx: &DecisionContext<'_>, unit: &ObjectId) -> Result<u32, ProtocolError> {
    ctx.game.require(unit)?.parse("spaceLeft")
}

impl<C: Connection, P: AiPolicy> ClientHandler for AiPlayer<C, P> {
    fn choose_founding_father(&self, message: ChooseFoundingFather) {
        self.choose_founding_father_handler(message);
    }

    fn diplomacy(&self, message: Diplomacy) {
        self.diplomacy_handler(message);
    }

    fn first_contact(&self, message: FirstContact) {
        self.first_contact_handler(message);
    }

    fn fountain_of_youth(&self, message: FountainOfYouth) {
        self.fountain_of_youth_handler(message);
    }

    fn indian_demand(&self, message: IndianDemand) {
        self.indian_demand_handler(message);
    }

    fn loot_cargo(&self, message: LootCargo) {
        self.loot_cargo_handler(message);
    }

    fn monarch_action(&self, message: MonarchActionMessage) {
        self.monarch_action_handler(message);
    }

    fn nation_summary(&self, message: NationSummaryMessage) {
        self.nation_summary_handler(message);
    }

    fn native_trade(&self, message: NativeTradeMessage) {
        self.native_trade_handler(message);
    }

    fn new_land_name(&self, message: NewLandName) {
        self.new_land_name_handler(message);
    }
}
