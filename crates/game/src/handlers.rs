//! # Session Handlers
//!
//! Game logic behind each inbound opcode, plus the session lifecycle steps
//! that do not come from a packet (events, migration, disconnect).
//!
//! Every packet handler has the same shape:
//! `async fn(&GameContext, &mut Session, PacketReader) -> Result<()>`. The
//! dispatcher decides what an error means for the connection; handlers only
//! close the session themselves when they reject a login.

use std::sync::Arc;

use mserver_core::{CharacterId, OnlineState, Result, ServerError, SkillId};
use mserver_protocol::{
    build_buddy_invite, build_buddy_list, build_cooldown, build_enter_map, build_keymap, build_skill_macros,
    now_unix_millis, BuddyListOp, PacketReader, PacketWriter,
};
use mserver_skills::tables::HIDE;
use mserver_storage::CharacterStore;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::capabilities::{Cooldownable, HasBuddyList};
use crate::character::{ActiveBuff, Character};
use crate::context::GameContext;
use crate::cooldown::Cancelled;
use crate::registry::PlayerHandle;
use crate::session::{Session, SessionEvent, SessionState};

/// Run a store call on the blocking pool
async fn with_store<T, F>(ctx: &GameContext, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn CharacterStore) -> mserver_storage::Result<T> + Send + 'static,
{
    let store = Arc::clone(&ctx.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ServerError::PersistenceFailure(format!("store task failed: {}", e)))?
        .map_err(ServerError::from)
}

/// Handle PLAYER_CONNECTED
///
/// # Purpose
/// Admits a character handed over by the login server or another channel.
///
/// # Process
/// 1. Load the character; if it cannot be loaded, stop without touching the
///    session
/// 2. Require the account's persisted `Migrating` marker, a fresh
///    connection, and no registry entry for the character; otherwise close
///    the session and fail with `DoubleLogin`
/// 3. Claim the registry slot, then atomically move the persisted marker
///    from `Migrating` to `InGame`; losing that claim is a double login
/// 4. Send the map-entry packet
/// 5. Re-apply carried buffs; on a fresh login send the buddy list and
///    pending invites
/// 6. Hide visible staff characters
/// 7. Announce the character to its buddies
/// 8. Send key bindings and skill macros
///
/// Steps 1-3 either fully succeed or leave nothing behind. Failures after
/// that are logged and the character stays in game.
pub async fn handle_player_connected(ctx: &GameContext, session: &mut Session, mut body: PacketReader) -> Result<()> {
    let cid = CharacterId(body.read_i32()?);

    let record = match with_store(ctx, move |store| store.load_character(cid)).await {
        Ok(record) => record,
        Err(e) => {
            warn!("Session {}: could not load character {}: {}", session.id(), cid, e);
            return Ok(());
        }
    };
    let mut character = Character::from_record(record);
    let account = character.account_id();

    let persisted = with_store(ctx, move |store| store.online_state(account)).await?;
    let allowed = persisted == OnlineState::Migrating
        && session.state() == SessionState::Connected
        && !ctx.registry.contains(cid);
    if !allowed {
        return Err(reject_double_login(session, &character));
    }

    session.adopt_handoff(account)?;
    let handle = PlayerHandle {
        character_id: cid,
        name: character.name().to_string(),
        session: session.id(),
        map: character.map(),
        outbound: session.outbound().clone(),
        buddies: character.buddy_list().ids(),
    };
    if ctx.registry.register(handle).is_err() {
        // Lost a race with another connection for the same character
        return Err(reject_double_login(session, &character));
    }
    match with_store(ctx, move |store| store.claim_in_game(account)).await {
        Ok(true) => {}
        Ok(false) => {
            // Another server admitted the account since the check above
            ctx.registry.deregister(cid, session.id());
            return Err(reject_double_login(session, &character));
        }
        Err(e) => {
            ctx.registry.deregister(cid, session.id());
            session.close(format!("Could not mark {} as in game", character.name()));
            return Err(e);
        }
    }
    session.transition(SessionState::InGame)?;

    rearm_cooldowns(ctx, session, &mut character);

    let mut char_data = PacketWriter::new();
    match ctx.char_data.encode(&character, &mut char_data) {
        Ok(()) => session.send(build_enter_map(
            ctx.channel,
            ctx.seeds.as_ref(),
            &char_data.into_bytes(),
            now_unix_millis(),
        )),
        Err(e) => warn!("Could not encode character data of {}: {}", character.name(), e),
    }

    let first_login = !ctx.coordinator.apply_buffs_from_last_channel(&mut character).await;
    if character.is_visible() && character.privilege().is_staff() {
        apply_hide(ctx, &mut character).await;
    }
    ctx.field.spawn_player(&character).await;

    if first_login {
        let buddies = character.buddy_list();
        match build_buddy_list(BuddyListOp::Update, &buddies.entries()) {
            Ok(frame) => session.send(frame),
            Err(e) => warn!("Could not encode buddy list of {}: {}", character.name(), e),
        }
        for (from, name) in buddies.invites() {
            match build_buddy_invite(from.get(), name) {
                Ok(frame) => session.send(frame),
                Err(e) => warn!("Could not encode buddy invite from {}: {}", from, e),
            }
        }
    }
    ctx.coordinator.notify_online(&character, ctx.channel).await;

    match build_keymap(character.keymap()) {
        Ok(frame) => session.send(frame),
        Err(e) => warn!("Could not encode key bindings of {}: {}", character.name(), e),
    }
    match build_skill_macros(character.macros()) {
        Ok(frame) => session.send(frame),
        Err(e) => warn!("Could not encode skill macros of {}: {}", character.name(), e),
    }

    info!(
        "{} entered channel {} ({})",
        character.name(),
        ctx.channel,
        if first_login { "login" } else { "transfer" }
    );
    session.attach_character(character);
    Ok(())
}

fn reject_double_login(session: &mut Session, character: &Character) -> ServerError {
    let reason = format!(
        "Player {} tried to double login on world {}",
        character.name(),
        session.world()
    );
    warn!("{}", reason);
    session.close(reason);
    ServerError::DoubleLogin {
        character: character.id(),
    }
}

/// Restart cooldowns saved with the character
fn rearm_cooldowns(ctx: &GameContext, session: &Session, character: &mut Character) {
    let now = Instant::now();
    for (skill, seconds) in character.take_saved_cooldowns() {
        if seconds <= 0 {
            continue;
        }
        let duration = Duration::from_secs(seconds as u64);
        character.add_cooldown(skill, now + duration);
        ctx.cooldowns.add(character.id(), skill, duration, session.events().clone());
    }
}

async fn apply_hide(ctx: &GameContext, character: &mut Character) {
    let effects = Arc::clone(&ctx.effects);
    let duration = match tokio::task::spawn_blocking(move || effects.skill(HIDE)).await {
        Ok(stats) => stats.and_then(|s| s.level(1).map(|e| e.duration)),
        Err(e) => {
            warn!("Effect lookup for hide failed: {}", e);
            None
        }
    };
    character.hide();
    character.apply_buff(
        HIDE,
        ActiveBuff {
            level: 1,
            expires_at: duration
                .filter(|ms| *ms > 0)
                .map(|ms| Instant::now() + Duration::from_millis(ms as u64)),
        },
    );
    debug!("{} is hidden", character.name());
}

/// Start a cooldown on the session's character
///
/// # Returns
/// `InvalidState` if the session has no character in game
pub fn start_cooldown(ctx: &GameContext, session: &mut Session, skill: SkillId, seconds: i16) -> Result<()> {
    let events = session.events().clone();
    let character = in_game_character(session)?;
    let duration = Duration::from_secs(seconds.max(0) as u64);
    character.add_cooldown(skill, Instant::now() + duration);
    ctx.cooldowns.add(character.id(), skill, duration, events);
    session.send(build_cooldown(skill, seconds));
    Ok(())
}

/// Cancel a cooldown early, telling the client it is over
///
/// A cooldown whose deadline already passed is reported through the usual
/// expiry event instead, so the client hears about it once.
///
/// # Returns
/// `false` if the skill had no active cooldown
pub fn cancel_cooldown(ctx: &GameContext, session: &mut Session, skill: SkillId) -> Result<bool> {
    let character = in_game_character(session)?;
    let cid = character.id();
    character.remove_cooldown(skill);
    match ctx.cooldowns.cancel(cid, skill) {
        Some(Cancelled::Early) => {
            session.send(build_cooldown(skill, 0));
            Ok(true)
        }
        Some(Cancelled::Expired) => Ok(true),
        None => Ok(false),
    }
}

fn in_game_character(session: &mut Session) -> Result<&mut Character> {
    if session.state() != SessionState::InGame {
        return Err(ServerError::InvalidState(format!(
            "session {} is {:?}, not in game",
            session.id(),
            session.state()
        )));
    }
    let id = session.id();
    session
        .character_mut()
        .ok_or_else(|| ServerError::InvalidState(format!("session {} has no character", id)))
}

/// Handle PONG
pub async fn handle_pong(_ctx: &GameContext, session: &mut Session, _body: PacketReader) -> Result<()> {
    session.mark_pong();
    Ok(())
}

/// Handle CLIENT_ERROR: the client reports a crash message
pub async fn handle_client_error(_ctx: &GameContext, session: &mut Session, mut body: PacketReader) -> Result<()> {
    let message = body.read_length_prefixed_string()?;
    warn!("Session {} reported a client error: {}", session.id(), message);
    Ok(())
}

/// Handle MOVE_PLAYER
pub async fn handle_move_player(ctx: &GameContext, session: &mut Session, mut body: PacketReader) -> Result<()> {
    let Some(character) = playing(session) else {
        return Ok(());
    };
    ctx.field.move_player(character, &mut body).await
}

/// Handle NPC_TALK
pub async fn handle_npc_talk(ctx: &GameContext, session: &mut Session, mut body: PacketReader) -> Result<()> {
    let Some(character) = playing(session) else {
        return Ok(());
    };
    ctx.field.npc_talk(character, &mut body).await
}

/// Handle NPC_TALK_MORE
pub async fn handle_npc_talk_more(ctx: &GameContext, session: &mut Session, mut body: PacketReader) -> Result<()> {
    let Some(character) = playing(session) else {
        return Ok(());
    };
    ctx.field.npc_talk_more(character, &mut body).await
}

/// Character of an in-game session, or `None` (logged) for frames that
/// arrive before entry
fn playing(session: &mut Session) -> Option<&mut Character> {
    if session.state() != SessionState::InGame {
        debug!("Session {}: ignoring in-game frame in {:?}", session.id(), session.state());
        return None;
    }
    session.character_mut()
}

/// Handle the character-list chatter that needs no reply
pub async fn handle_no_op(_ctx: &GameContext, _session: &mut Session, _body: PacketReader) -> Result<()> {
    Ok(())
}

/// Process one event from the session's queue
pub fn handle_event(session: &mut Session, event: SessionEvent) {
    match event {
        SessionEvent::CooldownExpired { skill } => {
            let Some(character) = session.character_mut() else {
                return;
            };
            character.remove_cooldown(skill);
            session.send(build_cooldown(skill, 0));
        }
        SessionEvent::Kick { reason } => session.close(reason),
    }
}

/// Hand an in-game character over to another server
///
/// Parks its buffs with the coordinator, persists `Migrating` and closes the
/// connection. On a persistence failure the character stays in game.
pub async fn leave_for_migration(ctx: &GameContext, session: &mut Session) -> Result<()> {
    let Some(account) = session.account() else {
        return Err(ServerError::InvalidState(format!("session {} has no account", session.id())));
    };
    session.begin_migration()?;

    if let Err(e) = with_store(ctx, move |store| store.set_online_state(account, OnlineState::Migrating)).await {
        session.transition(SessionState::InGame)?;
        return Err(e);
    }
    if let Some(character) = session.character() {
        ctx.coordinator.stash_buffs(character).await;
    }
    session.close("Migrating");
    Ok(())
}

/// Tear down a session
///
/// Cancels the character's cooldowns, releases its registry slot, removes it
/// from its map and persists `Offline` unless the session was migrating.
/// Safe to call more than once.
pub async fn disconnect(ctx: &GameContext, session: &mut Session) {
    let previous = session.state();
    if previous == SessionState::Disconnected {
        return;
    }
    if let Err(e) = session.transition(SessionState::Disconnected) {
        warn!("{}", e);
        return;
    }

    let Some(character) = session.take_character() else {
        debug!("Session {} closed before entering the game", session.id());
        return;
    };
    let cid = character.id();
    ctx.cooldowns.cancel_all(cid);
    ctx.registry.deregister(cid, session.id());
    ctx.field.remove_player(cid, character.map()).await;

    if previous == SessionState::InGame {
        ctx.coordinator.notify_offline(cid, &character.buddy_list().ids()).await;
        let account = character.account_id();
        if let Err(e) = with_store(ctx, move |store| store.set_online_state(account, OnlineState::Offline)).await {
            warn!("Could not mark {} offline: {}", character.name(), e);
        }
    }
    info!(
        "{} left channel {}{}",
        character.name(),
        ctx.channel,
        session.close_reason().map(|r| format!(": {}", r)).unwrap_or_default()
    );
}
