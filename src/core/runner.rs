//! Application runner logic
//!
//! Handles the different subcommands of the bezy-objects binary

use std::io::{BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::cli::{CliArgs, Command};
use crate::core::config_file::ConfigFile;
use crate::core::settings::Settings;
use crate::external::{ExternalChangeReport, ResourceId};
use crate::logging;
use crate::notifications::ObjectId;
use crate::objects::font::RELOADED_GLYPHS;
use crate::objects::{Font, Glyph, Observable};

/// Run the subcommand given on the command line.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    let config = ConfigFile::load();
    let settings = Settings::resolve(&cli_args, config.as_ref());
    let _log_guard = logging::init(&settings.log_filter, settings.log_to_file)?;

    match &cli_args.command {
        Command::InitConfig => ConfigFile::initialize_config_directory(),
        Command::Inspect { ufo, glyphs } => {
            let font = open_font(ufo, &settings)?;
            let summary = inspect(&font, glyphs)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Monitor { ufo, glyphs, all } => {
            let font = open_font(ufo, &settings)?;
            load_for_monitoring(&font, glyphs, *all)?;
            let stdin = std::io::stdin();
            monitor(&font, stdin.lock(), &mut std::io::stdout())
        }
    }
}

fn open_font(path: &Path, settings: &Settings) -> Result<Rc<Font>> {
    Font::open_with(path, settings.font_options())
        .with_context(|| format!("could not open {}", path.display()))
}

fn glyph_summary(glyph: &Glyph) -> Result<Value> {
    let unicodes: Vec<String> = glyph
        .unicodes()
        .iter()
        .map(|c| format!("{:04X}", *c as u32))
        .collect();
    Ok(json!({
        "name": glyph.name(),
        "width": glyph.width(),
        "unicodes": unicodes,
        "contours": glyph.contour_count(),
        "components": glyph.components().len(),
        "bounds": glyph.bounds()?,
        "area": glyph.area()?,
    }))
}

/// JSON summary of a font and the requested glyphs
pub fn inspect(font: &Font, glyph_names: &[String]) -> Result<Value> {
    let info = font.info()?;
    let glyphs = glyph_names
        .iter()
        .map(|name| match font.glyph(name)? {
            Some(glyph) => glyph_summary(&glyph),
            None => Ok(json!({ "name": name, "missing": true })),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "path": font.path(),
        "familyName": info.family_name(),
        "styleName": info.style_name(),
        "unitsPerEm": info.units_per_em(),
        "glyphCount": font.glyph_count(),
        "kerningPairs": font.kerning()?.len(),
        "groups": font.groups()?.len(),
        "libKeys": font.lib()?.keys(),
        "glyphs": glyphs,
    }))
}

/// Load what the monitor should watch. Unloaded resources are never compared.
pub fn load_for_monitoring(font: &Font, glyphs: &[String], all: bool) -> Result<()> {
    let mut resources: Vec<ResourceId> = Vec::new();
    if all {
        resources.extend(ResourceId::FONT_LEVEL);
        resources.extend(font.glyph_names().into_iter().map(ResourceId::Glyph));
    } else {
        resources.extend(glyphs.iter().cloned().map(ResourceId::Glyph));
    }
    for resource in &resources {
        font.load_resource(resource)
            .with_context(|| format!("could not load {resource}"))?;
    }
    info!("Watching {} resources", resources.len() + 1);
    Ok(())
}

fn reload_changes(font: &Font, report: &ExternalChangeReport) -> Result<Value> {
    let mut reloaded = Vec::new();
    for resource in report.reloadable() {
        font.reload(resource)?;
        reloaded.push(resource.to_string());
    }
    let skipped: Vec<String> = report
        .conflicts()
        .into_iter()
        .map(|resource| {
            warn!("Not reloading {resource}: it has unsaved edits");
            resource.to_string()
        })
        .collect();
    Ok(json!({ "reloaded": reloaded, "skipped": skipped }))
}

/// Answer commands read line by line from `input` until it ends or `quit`
/// is read.
pub fn monitor(font: &Font, input: impl BufRead, output: &mut impl Write) -> Result<()> {
    let observer = ObjectId::next();
    font.add_observer(observer, "log_reloaded_glyphs", RELOADED_GLYPHS, |notification| {
        info!("{notification}: {:?}", notification.get("glyphNames"));
        Ok(())
    })?;

    for line in input.lines() {
        let line = line?;
        let value = match line.trim() {
            "" | "check" => serde_json::to_value(font.test_for_external_changes()?)?,
            "reload" => {
                let report = font.test_for_external_changes()?;
                reload_changes(font, &report)?
            }
            "quit" | "exit" => break,
            other => json!({ "error": format!("unknown command '{other}'") }),
        };
        writeln!(output, "{value}")?;
        output.flush()?;
    }

    font.remove_observer(observer, None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Contour, UfoPoint};
    use std::fs;
    use std::io::Cursor;
    use std::time::{Duration, SystemTime};

    fn saved_font(dir: &Path) -> std::path::PathBuf {
        let font = Font::new().unwrap();
        font.info().unwrap().set_family_name(Some("Monitor Sans".into())).unwrap();
        font.kerning().unwrap().set("A", "V", -50.0).unwrap();
        let glyph = font.new_glyph("A").unwrap();
        glyph
            .append_contour(Contour::new(vec![
                UfoPoint::line_to(0.0, 0.0),
                UfoPoint::line_to(300.0, 700.0),
                UfoPoint::line_to(600.0, 0.0),
            ]))
            .unwrap();
        let path = dir.join("Monitor.ufo");
        font.save_as(&path).unwrap();
        path
    }

    #[test]
    fn inspect_reports_glyph_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let font = Font::open(saved_font(dir.path())).unwrap();
        let summary = inspect(&font, &["A".to_string(), "Z".to_string()]).unwrap();

        assert_eq!(summary["familyName"], "Monitor Sans");
        assert_eq!(summary["kerningPairs"], 1);
        assert_eq!(summary["glyphs"][0]["contours"], 1);
        assert_eq!(summary["glyphs"][0]["area"], 210000.0);
        assert_eq!(summary["glyphs"][1]["missing"], true);
    }

    #[test]
    fn monitor_reloads_clean_resources() {
        let dir = tempfile::tempdir().unwrap();
        let path = saved_font(dir.path());
        let font = Font::open(&path).unwrap();
        load_for_monitoring(&font, &[], true).unwrap();

        let kerning_file = path.join("kerning.plist");
        let edited = fs::read_to_string(&kerning_file).unwrap().replace("-50", "-75");
        fs::write(&kerning_file, edited).unwrap();
        let later = SystemTime::now() + Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&kerning_file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let mut output = Vec::new();
        monitor(&font, Cursor::new("check\nreload\nquit\ncheck\n"), &mut output).unwrap();
        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["resources"]["kerning"]["change"]["kind"], "modifiedOnDisk");
        assert_eq!(lines[1]["reloaded"], json!(["kerning"]));
        assert_eq!(font.kerning().unwrap().get("A", "V"), Some(-75.0));
    }
}
