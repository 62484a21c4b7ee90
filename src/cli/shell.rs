//! Interactive collage shell
//!
//! Mirrors the form-driven flow: add photos, search keywords, pick stickers,
//! then reorder, remove and place layers before saving. Layer numbers typed by
//! the user start at 1, matching `list` output.

use crate::{
    compositor::Compositor,
    config::CollageConfig,
    export::save_png,
    importer::{CollageImporter, ImportReport},
    item::Placement,
    search::parse_keywords,
    session::CollageSession,
    sticker::Sticker,
};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  add <file>...                 add photos (background removed)
  search <kw>[, <kw>...]        search each keyword and add the first image
  sticker [name|emoji]          add a sticker, or list the stickers
  list                          show layers, bottom first
  up <n> | down <n>             move layer n one step
  rm <n>                        delete layer n
  place <n> <x> <y> <width> [deg]   pin layer n
  place <n> auto                let the layout place layer n
  preview                       show where each layer will be drawn
  save                          render and write the PNG
  clear                         remove every layer
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShellCommand {
    Help,
    Add(Vec<PathBuf>),
    Search(Vec<String>),
    Sticker(Option<Sticker>),
    List,
    Up(usize),
    Down(usize),
    Remove(usize),
    Place {
        index: usize,
        placement: Option<Placement>,
    },
    Preview,
    Save,
    Clear,
    Quit,
}

impl ShellCommand {
    /// Parse one input line; blank lines yield `None`
    ///
    /// Layer numbers are converted to 0-based indices.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let parsed = match command.to_lowercase().as_str() {
            "" => return Ok(None),
            "help" | "?" => Self::Help,
            "add" => {
                if args.is_empty() {
                    anyhow::bail!("usage: add <file>...");
                }
                Self::Add(args.iter().map(PathBuf::from).collect())
            },
            "search" => {
                let keywords = parse_keywords(rest);
                if keywords.is_empty() {
                    anyhow::bail!("usage: search <keyword>[, <keyword>...]");
                }
                Self::Search(keywords)
            },
            "sticker" => match rest {
                "" => Self::Sticker(None),
                name => Self::Sticker(Some(name.parse()?)),
            },
            "list" | "ls" => Self::List,
            "up" => Self::Up(layer_arg(&args)?),
            "down" => Self::Down(layer_arg(&args)?),
            "rm" | "remove" => Self::Remove(layer_arg(&args)?),
            "place" => Self::parse_place(&args)?,
            "preview" => Self::Preview,
            "save" | "render" => Self::Save,
            "clear" => Self::Clear,
            "quit" | "exit" | "q" => Self::Quit,
            other => anyhow::bail!("unknown command '{}', type 'help'", other),
        };
        Ok(Some(parsed))
    }

    fn parse_place(args: &[&str]) -> Result<Self> {
        let index = layer_arg(args)?;
        match args.get(1..).unwrap_or_default() {
            ["auto"] => Ok(Self::Place {
                index,
                placement: None,
            }),
            [x, y, width, rotation @ ..] if rotation.len() <= 1 => {
                let mut placement = Placement::new(
                    x.parse().context("x must be an integer")?,
                    y.parse().context("y must be an integer")?,
                    width.parse().context("width must be a positive integer")?,
                );
                if let Some(degrees) = rotation.first() {
                    let degrees: f32 = degrees.parse().context("invalid rotation")?;
                    placement = placement.with_rotation(degrees);
                }
                placement.validate()?;
                Ok(Self::Place {
                    index,
                    placement: Some(placement),
                })
            },
            _ => anyhow::bail!("usage: place <n> <x> <y> <width> [deg] | place <n> auto"),
        }
    }
}

fn layer_arg(args: &[&str]) -> Result<usize> {
    let raw = args.first().context("a layer number is required")?;
    let layer: usize = raw
        .parse()
        .with_context(|| format!("'{}' is not a layer number", raw))?;
    layer.checked_sub(1).context("layer numbers start at 1")
}

/// Run the shell until `quit` or end of input
pub(crate) async fn run(
    session: &mut CollageSession,
    importer: &mut CollageImporter,
    config: &CollageConfig,
) -> Result<()> {
    let compositor = Compositor::from_config(config);
    println!("🎨 {} ({} layers). Type 'help' for commands.", session.title(), session.len());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("collage> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read input")?;

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("❌ {}", e);
                continue;
            },
        };
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = execute(command, session, importer, config, &compositor).await {
            println!("❌ {}", e);
        }
    }
    Ok(())
}

async fn execute(
    command: ShellCommand,
    session: &mut CollageSession,
    importer: &mut CollageImporter,
    config: &CollageConfig,
    compositor: &Compositor,
) -> Result<()> {
    match command {
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Add(paths) => print_failures(&importer.import_files(session, &paths)),
        ShellCommand::Search(keywords) => {
            print_failures(&importer.import_search(session, &keywords).await);
        },
        ShellCommand::Sticker(None) => {
            for sticker in Sticker::ALL {
                println!("  {}", sticker);
            }
        },
        ShellCommand::Sticker(Some(sticker)) => {
            let index = CollageImporter::add_sticker(session, sticker, config.sticker_size);
            println!("{} added as layer {}", sticker.emoji(), index + 1);
        },
        ShellCommand::List => print_layers(session),
        ShellCommand::Up(index) => {
            if !session.move_up(index)? {
                println!("Layer {} is already at the bottom", index + 1);
            }
            print_layers(session);
        },
        ShellCommand::Down(index) => {
            if !session.move_down(index)? {
                println!("Layer {} is already on top", index + 1);
            }
            print_layers(session);
        },
        ShellCommand::Remove(index) => {
            let removed = session.remove(index)?;
            println!("🗑️  Removed {}", removed.name);
            print_layers(session);
        },
        ShellCommand::Place { index, placement } => session.set_placement(index, placement)?,
        ShellCommand::Preview => {
            for (label, placement) in session
                .layer_labels()
                .iter()
                .zip(compositor.plan(session.items()))
            {
                println!(
                    "  {} at ({}, {}) {}x{} rot {:.0}°",
                    label, placement.x, placement.y, placement.width, placement.height,
                    placement.rotation
                );
            }
        },
        ShellCommand::Save => {
            let canvas = compositor.render(session)?;
            let path = save_png(&canvas, &config.output_dir, session.user_name())?;
            println!("💾 Saved {}", path.display());
        },
        ShellCommand::Clear => session.clear(),
        ShellCommand::Quit => {},
    }
    Ok(())
}

pub(crate) fn print_layers(session: &CollageSession) {
    if session.is_empty() {
        println!("  (no layers yet)");
        return;
    }
    for label in session.layer_labels() {
        println!("  {}", label);
    }
}

pub(crate) fn print_failures(report: &ImportReport) {
    for failure in &report.failures {
        println!("  ❌ {}: {}", failure.source, failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellCommand {
        ShellCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
        assert_eq!(parse("LIST"), ShellCommand::List);
        assert_eq!(parse("up 2"), ShellCommand::Up(1));
        assert_eq!(parse("rm 1"), ShellCommand::Remove(0));
        assert_eq!(
            parse("search  IU,  Hanni ,"),
            ShellCommand::Search(vec!["IU".to_string(), "Hanni".to_string()])
        );
        assert_eq!(parse("sticker 🍀"), ShellCommand::Sticker(Some(Sticker::Clover)));
        assert_eq!(parse("sticker"), ShellCommand::Sticker(None));
        assert_eq!(
            parse("add a.png b.jpg"),
            ShellCommand::Add(vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")])
        );
        assert_eq!(parse("quit"), ShellCommand::Quit);
    }

    #[test]
    fn test_parse_place() {
        assert_eq!(
            parse("place 1 10 -20 300"),
            ShellCommand::Place {
                index: 0,
                placement: Some(Placement::new(10, -20, 300)),
            }
        );
        assert_eq!(
            parse("place 2 0 0 100 45"),
            ShellCommand::Place {
                index: 1,
                placement: Some(Placement::new(0, 0, 100).with_rotation(45.0)),
            }
        );
        assert_eq!(
            parse("place 3 auto"),
            ShellCommand::Place {
                index: 2,
                placement: None,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        for line in [
            "up", "up 0", "down x", "add", "search , ,", "sticker unicorn", "place 1 2 3",
            "place 1 0 0 0", "place 1 0 0 10 5 6", "dance",
        ] {
            assert!(ShellCommand::parse(line).is_err(), "{line} should fail");
        }
    }

    #[test]
    fn test_parse_place_rejects_oversized_width() {
        use crate::item::MAX_LAYER_SIDE;

        assert!(ShellCommand::parse("place 1 0 0 100000").is_err());
        let too_wide = format!("place 1 0 0 {}", MAX_LAYER_SIDE + 1);
        assert!(ShellCommand::parse(&too_wide).is_err());
        assert_eq!(
            parse(&format!("place 1 0 0 {}", MAX_LAYER_SIDE)),
            ShellCommand::Place {
                index: 0,
                placement: Some(Placement::new(0, 0, MAX_LAYER_SIDE)),
            }
        );
    }
}
