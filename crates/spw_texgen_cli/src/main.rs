use image::{ImageFormat, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

use spw_core::{Color, PixelBuffer};
use spw_render::{GraphicsDevice, Texture2D};
use spw_texgen::TextureFactory;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Rect {
        width: u32,
        height: u32,
        color: Color,
        hollow: bool,
        output: PathBuf,
    },
    Circle {
        radius: f32,
        color: Color,
        hollow: bool,
        output: PathBuf,
    },
    /// Frames laid side by side in one strip.
    Fade {
        width: u32,
        height: u32,
        from: Color,
        to: Color,
        frames: usize,
        output: PathBuf,
    },
    Crop {
        input: PathBuf,
        output: PathBuf,
        whitespace: Vec<Color>,
    },
    Progress {
        width: u32,
        height: u32,
        fraction: f32,
        fill: Color,
        empty: Color,
        output: PathBuf,
    },
}

fn usage() -> String {
    [
        "Usage: spw_texgen <command> <args...>",
        "  rect <width> <height> <color> <out.png>",
        "  hollow-rect <width> <height> <color> <out.png>",
        "  circle <radius> <color> <out.png>",
        "  hollow-circle <radius> <color> <out.png>",
        "  fade <width> <height> <from> <to> <frames> <out.png>",
        "  crop <in.png> <out.png> [whitespace colours...]",
        "  progress <width> <height> <fraction> <fill> <empty> <out.png>",
        "Colours are #rrggbb or #rrggbbaa.",
        "Example: cargo run -p spw_texgen_cli -- circle 12 #ffcc00 assets/generated/coin.png",
    ]
    .join("\n")
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| format!("Invalid {name} '{raw}': {e}"))
}

fn parse_color(name: &str, raw: &str) -> Result<Color, String> {
    Color::from_hex(raw).ok_or_else(|| format!("Invalid {name} colour '{raw}'"))
}

fn expect_args<'a>(
    command: &str,
    args: &'a [String],
    count: usize,
) -> Result<&'a [String], String> {
    if args.len() != count {
        return Err(format!(
            "'{command}' takes {count} arguments, got {}\n{}",
            args.len(),
            usage()
        ));
    }
    Ok(args)
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err(usage());
    };
    match command.as_str() {
        "rect" | "hollow-rect" => {
            let a = expect_args(command, rest, 4)?;
            Ok(Command::Rect {
                width: parse_number("width", &a[0])?,
                height: parse_number("height", &a[1])?,
                color: parse_color("fill", &a[2])?,
                hollow: command == "hollow-rect",
                output: PathBuf::from(&a[3]),
            })
        }
        "circle" | "hollow-circle" => {
            let a = expect_args(command, rest, 3)?;
            Ok(Command::Circle {
                radius: parse_number("radius", &a[0])?,
                color: parse_color("fill", &a[1])?,
                hollow: command == "hollow-circle",
                output: PathBuf::from(&a[2]),
            })
        }
        "fade" => {
            let a = expect_args(command, rest, 6)?;
            Ok(Command::Fade {
                width: parse_number("width", &a[0])?,
                height: parse_number("height", &a[1])?,
                from: parse_color("start", &a[2])?,
                to: parse_color("end", &a[3])?,
                frames: parse_number("frame count", &a[4])?,
                output: PathBuf::from(&a[5]),
            })
        }
        "crop" => {
            if rest.len() < 2 {
                return Err(format!("'crop' needs an input and an output\n{}", usage()));
            }
            let whitespace = if rest.len() == 2 {
                vec![Color::TRANSPARENT]
            } else {
                rest[2..]
                    .iter()
                    .map(|raw| parse_color("whitespace", raw))
                    .collect::<Result<Vec<_>, _>>()?
            };
            Ok(Command::Crop {
                input: PathBuf::from(&rest[0]),
                output: PathBuf::from(&rest[1]),
                whitespace,
            })
        }
        "progress" => {
            let a = expect_args(command, rest, 6)?;
            Ok(Command::Progress {
                width: parse_number("width", &a[0])?,
                height: parse_number("height", &a[1])?,
                fraction: parse_number("fraction", &a[2])?,
                fill: parse_color("fill", &a[3])?,
                empty: parse_color("empty", &a[4])?,
                output: PathBuf::from(&a[5]),
            })
        }
        other => Err(format!("Unknown command '{other}'\n{}", usage())),
    }
}

fn run(command: Command) -> Result<(), String> {
    let factory = TextureFactory::new(GraphicsDevice::new(1, 1));
    let fail = |e: spw_texgen::TextureError| e.to_string();
    match command {
        Command::Rect {
            width,
            height,
            color,
            hollow,
            output,
        } => {
            let texture = if hollow {
                factory.create_hollow_rectangle(width, height, color)
            } else {
                factory.create_rectangle(width, height, color)
            }
            .map_err(fail)?;
            write_png(&texture, &output)
        }
        Command::Circle {
            radius,
            color,
            hollow,
            output,
        } => {
            let texture = if hollow {
                factory.create_hollow_circle(radius, color)
            } else {
                factory.create_circle(radius, color)
            }
            .map_err(fail)?;
            write_png(&texture, &output)
        }
        Command::Fade {
            width,
            height,
            from,
            to,
            frames,
            output,
        } => {
            let first = factory.create_rectangle(width, height, from).map_err(fail)?;
            let last = factory.create_rectangle(width, height, to).map_err(fail)?;
            let strip = factory
                .create_fade_strip(&first, &last, frames)
                .map_err(fail)?;
            write_png(&strip, &output)
        }
        Command::Crop {
            input,
            output,
            whitespace,
        } => {
            let original = read_png(factory.device(), &input)?;
            let cropped = factory
                .crop_whitespace(&original, &whitespace)
                .map_err(fail)?;
            log::info!(
                "Cropped {}x{} to {}x{}",
                original.width(),
                original.height(),
                cropped.width(),
                cropped.height()
            );
            write_png(&cropped, &output)
        }
        Command::Progress {
            width,
            height,
            fraction,
            fill,
            empty,
            output,
        } => {
            let texture = factory
                .create_progress_bar(width, height, fraction, fill, empty)
                .map_err(fail)?;
            write_png(&texture, &output)
        }
    }
}

fn read_png(device: &GraphicsDevice, path: &Path) -> Result<Texture2D, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open '{}': {e}", path.display()))?
        .to_rgba8();
    let (w, h) = image.dimensions();
    let buffer = PixelBuffer::from_rgba8(w, h, image.as_raw())
        .map_err(|e| format!("Invalid image '{}': {e}", path.display()))?;
    Ok(device.texture_from_buffer(buffer))
}

/// Write through a temporary file so a failed encode never leaves a
/// truncated PNG at `path`.
fn write_png(texture: &Texture2D, path: &Path) -> Result<(), String> {
    let (w, h) = texture.size();
    let image = RgbaImage::from_raw(w, h, texture.buffer().to_rgba8())
        .ok_or_else(|| format!("Pixel data does not match {w}x{h}"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {e}", parent.display()))?;
    }
    let temp_path = temporary_output_path(path);
    image
        .save_with_format(&temp_path, ImageFormat::Png)
        .map_err(|e| format!("Failed to write '{}': {e}", temp_path.display()))?;
    promote_temporary_file(&temp_path, path)?;
    log::info!("Wrote {}x{} PNG to {}", w, h, path.display());
    Ok(())
}

fn temporary_output_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{file_name}.tmp"))
}

fn promote_temporary_file(temp_path: &Path, final_path: &Path) -> Result<(), String> {
    if final_path.exists() {
        fs::remove_file(final_path).map_err(|e| {
            format!(
                "Failed to replace existing output '{}': {e}",
                final_path.display()
            )
        })?;
    }
    fs::rename(temp_path, final_path).map_err(|e| {
        format!(
            "Failed to move temporary output '{}' -> '{}': {e}",
            temp_path.display(),
            final_path.display()
        )
    })
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    run(parse_args(&args)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn test_temp_path(hint: &str) -> PathBuf {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("spw_texgen_test_{}_{}.png", hint, nanos))
    }

    #[test]
    fn parses_hollow_rect() {
        let command = parse_args(&args("hollow-rect 4 3 #ff0000 out.png")).expect("parse");
        assert_eq!(
            command,
            Command::Rect {
                width: 4,
                height: 3,
                color: Color::RED,
                hollow: true,
                output: PathBuf::from("out.png"),
            }
        );
    }

    #[test]
    fn crop_defaults_to_transparent_whitespace() {
        match parse_args(&args("crop in.png out.png")).expect("parse") {
            Command::Crop { whitespace, .. } => assert_eq!(whitespace, vec![Color::TRANSPARENT]),
            other => panic!("unexpected {other:?}"),
        }
        match parse_args(&args("crop in.png out.png #ffffff #000000")).expect("parse") {
            Command::Crop { whitespace, .. } => {
                assert_eq!(whitespace, vec![Color::WHITE, Color::BLACK])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args("spiral 3 out.png")).is_err());
        assert!(parse_args(&args("circle 3 out.png")).is_err());
        assert!(parse_args(&args("rect four 3 #ff0000 out.png"))
            .expect_err("bad width")
            .contains("width"));
        assert!(parse_args(&args("circle 3 red out.png"))
            .expect_err("bad colour")
            .contains("colour"));
    }

    #[test]
    fn fade_writes_strip() {
        let path = test_temp_path("fade");
        run(Command::Fade {
            width: 2,
            height: 1,
            from: Color::BLACK,
            to: Color::WHITE,
            frames: 3,
            output: path.clone(),
        })
        .expect("run");

        let image = image::open(&path).expect("open").to_rgba8();
        assert_eq!(image.dimensions(), (6, 1));
        // The first frame is already one step away from the start colour.
        assert_eq!(image.get_pixel(0, 0).0, [85, 85, 85, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [85, 85, 85, 255]);
        assert_eq!(image.get_pixel(5, 0).0, [255, 255, 255, 255]);
        assert!(!temporary_output_path(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn crop_round_trips_through_png() {
        let input = test_temp_path("crop_in");
        let output = test_temp_path("crop_out");
        let device = GraphicsDevice::new(1, 1);
        let mut buffer = PixelBuffer::new(5, 5).expect("buffer");
        buffer.set(2, 1, Color::RED);
        buffer.set(3, 3, Color::RED);
        write_png(&device.texture_from_buffer(buffer), &input).expect("write");

        run(Command::Crop {
            input: input.clone(),
            output: output.clone(),
            whitespace: vec![Color::TRANSPARENT],
        })
        .expect("run");

        let image = image::open(&output).expect("open").to_rgba8();
        assert_eq!(image.dimensions(), (2, 3));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        let _ = fs::remove_file(&input);
        let _ = fs::remove_file(&output);
    }
}
