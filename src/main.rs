use clap::Parser;
use gametex::format::REGISTRY;
use gametex::{DecodeOptions, EncodedTexture, Palette, TextureDecoder};
use log::{error, info, warn};
use std::error::Error;
use std::fs::{self, read_to_string};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(version, about = "Decode raw texture payloads to PNG", long_about = None)]
struct Args {
    /// Headerless payload to decode
    #[arg(short('f'), long)]
    file_name: Option<String>,

    /// Format id (0x47, 71) or name (BC1, RGB5A3)
    #[arg(short('t'), long)]
    format: Option<String>,

    #[arg(short('W'), long)]
    width: Option<u32>,

    #[arg(short('H'), long)]
    height: Option<u32>,

    /// Raw RGBA8 palette entries for C4/C8/C14X2
    #[arg(short('p'), long)]
    palette: Option<String>,

    #[arg(long)]
    normalize_bc5: bool,

    #[arg(long)]
    split_channels: bool,

    /// File with one `path format width height` entry per line
    #[arg(short('l'), long)]
    list: Option<String>,

    #[arg(short('o'), long, default_value_t = String::from("outputs"))]
    out_dir: String,
}

fn parse_format(s: &str) -> Result<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return Ok(u32::from_str_radix(hex, 16)?);
    }
    if let Ok(id) = s.parse::<u32>() {
        return Ok(id);
    }
    REGISTRY
        .iter()
        .find(|d| d.format.name().eq_ignore_ascii_case(s))
        .map(|d| d.id)
        .ok_or_else(|| format!("unknown format {s}").into())
}

fn output_stem(out_dir: &str, file_path: &Path) -> Result<PathBuf> {
    let stem = file_path
        .file_stem()
        .ok_or_else(|| format!("path {file_path:?} does not contain a file"))?;
    Ok(PathBuf::from(out_dir).join(stem))
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn dump_file(
    decoder: &TextureDecoder,
    file_path: &Path,
    format: u32,
    width: u32,
    height: u32,
    palette: Option<&Palette>,
    out_dir: &str,
) -> Result<()> {
    let data = fs::read(file_path)?;
    let mut tex = EncodedTexture::new(&data, format, width, height);
    if let Some(palette) = palette {
        tex = tex.with_palette(palette);
    }
    let decoded = decoder.decode(&tex)?;
    for w in &decoded.warnings {
        warn!("{file_path:?}: {w}");
    }

    let stem = output_stem(out_dir, file_path)?;
    fs::create_dir_all(out_dir)?;
    let output_path = with_suffix(&stem, ".png");
    decoded.image.save(&output_path)?;
    info!("saved {output_path:?}");
    for channel in &decoded.channels {
        let path = with_suffix(&stem, &format!(".{}.png", channel.channel.name()));
        channel.image.save(&path)?;
        info!("saved {path:?}");
    }
    Ok(())
}

fn parse_list_line(line: &str) -> Result<(PathBuf, u32, u32, u32)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [path, format, width, height] = fields[..] else {
        return Err(format!("expected `path format width height`, got {line:?}").into());
    };
    Ok((PathBuf::from(path), parse_format(format)?, width.parse()?, height.parse()?))
}

fn dump_all(decoder: &TextureDecoder, list_file: &str, palette: Option<&Palette>, out_dir: &str) -> Result<()> {
    let list = read_to_string(list_file)?;
    let mut failed = 0;
    for line in list.lines().filter(|l| !l.trim().is_empty()) {
        let (file_path, format, width, height) = match parse_list_line(line) {
            Ok(entry) => entry,
            Err(e) => {
                error!("could not parse list entry: {e}");
                failed += 1;
                continue;
            }
        };
        if let Err(e) = dump_file(decoder, &file_path, format, width, height, palette, out_dir) {
            error!("error dumping {file_path:?}: {e}");
            failed += 1;
        }
    }
    if failed > 0 {
        warn!("{failed} entries failed");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let now = SystemTime::now();
    let args = Args::parse();

    let options = DecodeOptions::default()
        .normalize_bc5(args.normalize_bc5)
        .split_channels(args.split_channels);
    let decoder = TextureDecoder::new(options);
    let palette = match &args.palette {
        Some(path) => Some(Palette::from_rgba8_bytes(&fs::read(path)?)),
        None => None,
    };

    match (&args.list, &args.file_name) {
        (Some(list), _) => dump_all(&decoder, list, palette.as_ref(), &args.out_dir)?,
        (None, Some(file_name)) => {
            let (Some(format), Some(width), Some(height)) = (&args.format, args.width, args.height) else {
                return Err("--format, --width and --height are required with --file-name".into());
            };
            let format = parse_format(format)?;
            dump_file(&decoder, Path::new(file_name), format, width, height, palette.as_ref(), &args.out_dir)?;
        }
        (None, None) => error!("must provide a file name or a list file"),
    }
    info!("time taken: {} ms", now.elapsed()?.as_millis());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_by_id_or_name() {
        assert_eq!(parse_format("0x47").unwrap(), 0x47);
        assert_eq!(parse_format("98").unwrap(), 0x62);
        assert_eq!(parse_format("rgb5a3").unwrap(), 0x05);
        assert_eq!(parse_format("BC7").unwrap(), 0x62);
        assert!(parse_format("astc").is_err());
    }

    #[test]
    fn list_lines_need_four_fields() {
        let (path, format, w, h) = parse_list_line("a/b.bin 0x53 64 32").unwrap();
        assert_eq!(path, PathBuf::from("a/b.bin"));
        assert_eq!((format, w, h), (0x53, 64, 32));
        assert!(parse_list_line("a/b.bin 0x53 64").is_err());
    }

    #[test]
    fn channel_outputs_share_the_stem() {
        let stem = output_stem("out", Path::new("dir/tex.bin")).unwrap();
        assert_eq!(with_suffix(&stem, ".alpha.png"), PathBuf::from("out/tex.alpha.png"));
    }
}
