use std::cmp;
use std::collections::BTreeMap;
use std::io::{stdout, Write};
use std::path::Path;

use adcp::ensemble::Ensemble;
use adcp::framing::PipelineStats;
use adcp::{decode_ensembles, DecodeStats, PipelineOpts};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use handlebars::handlebars_helper;
use serde::Serialize;
use tracing::debug;

use crate::open_input;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Default, Debug, Clone, Serialize)]
struct Summary {
    total_ensembles: usize,
    first_number: Option<u32>,
    last_number: Option<u32>,
    first_time: Option<NaiveDateTime>,
    last_time: Option<NaiveDateTime>,
    /// Seconds between first and last time.
    duration: Option<f64>,
}

impl Summary {
    fn update(&mut self, ensemble: &Ensemble) {
        self.total_ensembles += 1;
        let number = ensemble.number();
        self.first_number = Some(self.first_number.map_or(number, |cur| cmp::min(cur, number)));
        self.last_number = Some(self.last_number.map_or(number, |cur| cmp::max(cur, number)));

        let Some(time) = ensemble.ensemble_data.as_ref().and_then(|ed| ed.datetime()) else {
            debug!(ensemble = number, "no ensemble time");
            return;
        };
        let first = self.first_time.map_or(time, |cur| cmp::min(cur, time));
        let last = self.last_time.map_or(time, |cur| cmp::max(cur, time));
        self.first_time = Some(first);
        self.last_time = Some(last);
        self.duration = Some((last - first).num_milliseconds() as f64 / 1000.0);
    }
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    summary: Summary,
    /// Count of ensembles carrying each data-set tag.
    datasets: BTreeMap<String, usize>,
    stats: DecodeStats,
}

fn summarize(fpath: &Path, opts: &PipelineOpts) -> Result<Info> {
    let reader = open_input(fpath)?;
    let mut ensembles =
        decode_ensembles(reader, opts.clone()).context("starting decoder thread")?;

    let mut summary = Summary::default();
    let mut datasets: BTreeMap<String, usize> = BTreeMap::default();

    for zult in ensembles.by_ref() {
        let ensemble = zult.context("reading input")?;
        summary.update(&ensemble);
        for kind in ensemble.kinds() {
            let tag = kind.tag().unwrap_or_default().to_string();
            *datasets.entry(tag).or_default() += 1;
        }
        for unknown in &ensemble.unknown {
            *datasets.entry(unknown.header.tag()).or_default() += 1;
        }
    }

    let stats = ensembles
        .stats()
        .map_or_else(PipelineStats::default, |s| *s)
        .decoder;

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        summary,
        datasets,
        stats,
    })
}

pub fn info(fpath: &Path, format: &Format, opts: &PipelineOpts) -> Result<()> {
    let info = summarize(fpath, opts)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(0).max(v.len());
        format!("{v:>num$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("compiling text template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===========================================================================================
Ensembles:  {{ summary.total_ensembles }}
Numbers:    {{ summary.first_number }} - {{ summary.last_number }}
First:      {{ summary.first_time }}
Last:       {{ summary.last_time }}
Duration:   {{ summary.duration }}
-------------------------------------------------------------------------------------------
Data-set    Count
-------------------------------------------------------------------------------------------
{{ #each datasets }}{{ @key }}  {{ lpad 8 this }}
{{/each }}-------------------------------------------------------------------------------------------
Checksum failures:  {{ stats.checksum_failures }}
Malformed:          {{ stats.malformed }}
False syncs:        {{ stats.false_syncs }}
Garbage bytes:      {{ stats.garbage_bytes }}
Unknown data-sets:  {{ stats.unknown_datasets }}
";
