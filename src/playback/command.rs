//! External player process

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use super::{PlaybackRequest, PlaybackSurface};
use crate::config::PlayerConfig;
use crate::errors::{PlaybackError, PlaybackResult};

/// Launches a player command and waits for it to exit
///
/// Each argument is a template; `{url}`, `{title}`, `{id}` and `{thumbnail}`
/// are replaced with the request fields. Arguments are passed directly to the
/// process, never through a shell.
#[derive(Debug, Clone)]
pub struct CommandPlaybackSurface {
    command: String,
    args: Vec<String>,
}

impl CommandPlaybackSurface {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Expand the argument templates for one request
    pub fn render_args(&self, request: &PlaybackRequest) -> Vec<String> {
        self.args
            .iter()
            .map(|template| expand_template(template, request))
            .collect()
    }
}

/// Single left-to-right pass; substituted values are never expanded again
fn expand_template(template: &str, request: &PlaybackRequest) -> String {
    let fields = [
        ("{url}", request.media_url.as_str()),
        ("{title}", request.title.as_str()),
        ("{id}", request.id.as_str()),
        ("{thumbnail}", request.thumbnail_url.as_str()),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        match fields.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                rendered.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

#[async_trait]
impl PlaybackSurface for CommandPlaybackSurface {
    async fn play(&self, request: PlaybackRequest) -> PlaybackResult<()> {
        let args = self.render_args(&request);
        debug!("Launching player: {} {:?}", self.command, args);

        let mut cmd = TokioCommand::new(&self.command);
        cmd.args(&args);
        cmd.kill_on_drop(true);
        cmd.stdin(Stdio::null());

        let status = cmd.status().await.map_err(|e| PlaybackError::Launch {
            command: self.command.clone(),
            message: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            warn!("Player '{}' exited with {} for {}", self.command, status, request.id);
            Err(PlaybackError::PlayerExited {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::MediaKind;

    fn request() -> PlaybackRequest {
        PlaybackRequest {
            id: "m1".to_string(),
            media_url: "https://cdn.example.com/BigBuckBunny.mp4".to_string(),
            title: "Big Buck Bunny".to_string(),
            thumbnail_url: "https://img.example.com/bunny.jpg".to_string(),
            kind: MediaKind::Progressive,
        }
    }

    #[test]
    fn test_render_args() {
        let surface = CommandPlaybackSurface::from_config(&PlayerConfig::default());
        assert_eq!(
            surface.render_args(&request()),
            vec![
                "--force-media-title=Big Buck Bunny".to_string(),
                "https://cdn.example.com/BigBuckBunny.mp4".to_string(),
            ]
        );

        let custom = CommandPlaybackSurface::new(
            "player",
            vec!["--id={id}".into(), "--art={thumbnail}".into()],
        );
        assert_eq!(
            custom.render_args(&request()),
            vec!["--id=m1".to_string(), "--art=https://img.example.com/bunny.jpg".to_string()]
        );
    }

    #[test]
    fn test_render_args_keeps_placeholder_text_in_values() {
        let mut request = request();
        request.id = "x1".to_string();
        request.title = "Episode {id} {thumbnail}".to_string();

        let surface = CommandPlaybackSurface::new(
            "player",
            vec!["--title={title}".into(), "{id}-{unknown}-{".into()],
        );
        assert_eq!(
            surface.render_args(&request),
            vec![
                "--title=Episode {id} {thumbnail}".to_string(),
                "x1-{unknown}-{".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_command_is_launch_error() {
        let surface = CommandPlaybackSurface::new("tvstream-no-such-player", vec!["{url}".into()]);
        assert!(matches!(
            surface.play(request()).await,
            Err(PlaybackError::Launch { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_checked() {
        let ok = CommandPlaybackSurface::new("true", vec!["{url}".into()]);
        assert!(ok.play(request()).await.is_ok());

        let failing = CommandPlaybackSurface::new("false", vec![]);
        assert!(matches!(
            failing.play(request()).await,
            Err(PlaybackError::PlayerExited { .. })
        ));
    }
}
