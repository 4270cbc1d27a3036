//! Information commands: look, who, score, time, help.

use std::fmt::Write;

use chrono::Utc;

use super::{Context, Handler, HandlerError, HandlerResult};

pub struct LookHandler;

impl Handler for LookHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let room_id = ctx.session()?.room_id;
        let room = ctx
            .world
            .room(room_id)
            .ok_or_else(|| HandlerError::Internal(format!("session in missing room {room_id}")))?;

        let mut out = format!("\r\n{}\r\n  {}\r\n", room.name, room.description);
        for key in room.occupants().filter(|k| *k != ctx.actor) {
            let Some(other) = ctx.world.session(key) else {
                continue;
            };
            if other.is_link_dead() {
                let _ = write!(out, "{} is here, staring blankly. [link-dead]\r\n", other.name);
            } else {
                let _ = write!(out, "{} is here.\r\n", other.name);
            }
        }

        ctx.reply(&out);
        Ok(())
    }
}

pub struct WhoHandler;

impl Handler for WhoHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let mut sessions: Vec<_> = ctx.world.sessions().collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = format!("\r\nPlayers in {}:\r\n", ctx.texts.world_name);
        for session in &sessions {
            let _ = write!(
                out,
                "  [{:>3}] {} the {} {}",
                session.level, session.name, session.race, session.class
            );
            if session.is_link_dead() {
                out.push_str(" [link-dead]");
            }
            out.push_str("\r\n");
        }
        let _ = write!(out, "\r\n{} player(s) found.\r\n", sessions.len());

        ctx.reply(&out);
        Ok(())
    }
}

pub struct ScoreHandler;

impl Handler for ScoreHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let session = ctx.session()?;
        let out = format!(
            "\r\nYou are {}, a level {} {} {}.\r\n",
            session.name, session.level, session.race, session.class
        );
        ctx.reply(&out);
        Ok(())
    }
}

pub struct TimeHandler;

impl Handler for TimeHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let now = Utc::now();
        let played = (now - ctx.session()?.logged_in_at).num_seconds().max(0);
        let out = format!(
            "The server time is {}.\r\nYou have been playing for {}h {}m {}s.\r\n",
            now.format("%Y-%m-%d %H:%M:%S UTC"),
            played / 3600,
            played % 3600 / 60,
            played % 60
        );
        ctx.reply(&out);
        Ok(())
    }
}

pub struct HelpHandler;

impl Handler for HelpHandler {
    fn handle(&self, ctx: &mut Context<'_>, _args: &str) -> HandlerResult {
        let mut out = String::from("\r\nAvailable commands:\r\n");
        for (i, name) in ctx.commands.iter().enumerate() {
            let _ = write!(out, "{name:<12} ");
            if (i + 1) % 6 == 0 {
                out.push_str("\r\n");
            }
        }
        out.push_str("\r\n");
        ctx.reply(&out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use crate::state::sample_session;

    #[tokio::test]
    async fn look_lists_room_and_other_occupants() {
        let mut fx = Fixture::new().await;
        fx.world.insert(sample_session("Aria", 1, 1));
        fx.world.insert(sample_session("Bram", 2, 1));
        fx.world.insert(sample_session("Cole", 3, 2));

        let out = fx.run("aria", "look");
        assert!(out.starts_with("\r\nTown Square\r\n  A wide cobbled square.\r\n"));
        assert!(out.contains("Bram is here.\r\n"));
        assert!(!out.contains("Aria is here"));
        assert!(!out.contains("Cole"));
    }

    #[tokio::test]
    async fn look_marks_link_dead_occupants() {
        let mut fx = Fixture::new().await;
        fx.world.insert(sample_session("Aria", 1, 1));
        fx.world.insert(sample_session("Bram", 2, 1));
        fx.world.session_mut("bram").unwrap().detach();

        let out = fx.run("aria", "l");
        assert!(out.contains("Bram is here, staring blankly. [link-dead]"));
    }

    #[tokio::test]
    async fn who_lists_everyone_sorted() {
        let mut fx = Fixture::new().await;
        fx.world.insert(sample_session("Cole", 3, 2));
        fx.world.insert(sample_session("Aria", 1, 1));

        let out = fx.run("aria", "who");
        let aria = out.find("Aria the human warrior").unwrap();
        let cole = out.find("Cole the human warrior").unwrap();
        assert!(aria < cole);
        assert!(out.contains("2 player(s) found."));
    }

    #[tokio::test]
    async fn score_and_help() {
        let mut fx = Fixture::new().await;
        fx.world.insert(sample_session("Aria", 1, 1));

        assert_eq!(
            fx.run("aria", "score"),
            "\r\nYou are Aria, a level 1 human warrior.\r\n"
        );
        let help = fx.run("aria", "HELP");
        assert!(help.contains("look"));
        assert!(help.contains("quit"));
    }

    #[tokio::test]
    async fn time_reports_session_length() {
        let mut fx = Fixture::new().await;
        fx.world.insert(sample_session("Aria", 1, 1));
        let out = fx.run("aria", "time");
        assert!(out.starts_with("The server time is "));
        assert!(out.contains("You have been playing for 0h 0m"));
    }
}
