extern crate clap;
extern crate env_logger;
extern crate floodbrot;
extern crate log;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use floodbrot::{Pixel, RenderConfig, Selection, Strategy, View, ViewController};
use log::info;
use std::str::FromStr;
use std::time::Duration;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A selection is written `x0,y0:x1,y1`.
fn parse_selection(s: &str) -> Option<Selection> {
    let (from, to) = parse_pair::<String>(s, ':')?;
    let from = parse_pair::<usize>(&from, ',')?;
    let to = parse_pair::<usize>(&to, ',')?;
    Some(Selection::new(Pixel(from.0, from.1), Pixel(to.0, to.1)))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTRE: &str = "centre";
const SIDE: &str = "side";
const ZOOM: &str = "zoom";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const ROUNDS: &str = "rounds";
const STRIDE: &str = "stride";
const STRATEGY: &str = "strategy";
const TIMEOUT: &str = "timeout";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get().max(1) * 4;

    App::new("floodbrot")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Flood-fill Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (format chosen by extension)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("640x480")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTRE)
                .required(false)
                .long(CENTRE)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .requires(SIDE)
                .validator(|s| validate_pair::<String>(&s, ',', "Centre must be written re,im"))
                .help("Centre of the view as re,im; any number of digits"),
        )
        .arg(
            Arg::with_name(SIDE)
                .required(false)
                .long(SIDE)
                .short("w")
                .takes_value(true)
                .requires(CENTRE)
                .help("Width of the view on the complex plane"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(|s| match parse_selection(&s) {
                    Some(_) => Ok(()),
                    None => Err("Zoom must be written x0,y0:x1,y1".to_string()),
                })
                .help("Zoom into a pixel rectangle x0,y0:x1,y1; may be repeated"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of render workers (default: one per core)"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("2000")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Iterations after which a pixel is presumed inside the set"),
        )
        .arg(
            Arg::with_name(ROUNDS)
                .required(false)
                .long(ROUNDS)
                .short("r")
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse round count",
                        "Round count must be between 1 and 1000000",
                    )
                })
                .help("Iterations a worker spends on a pixel before handing it back"),
        )
        .arg(
            Arg::with_name(STRIDE)
                .required(false)
                .long(STRIDE)
                .takes_value(true)
                .default_value("10")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse seed stride",
                        "Seed stride must be between 1 and 65535",
                    )
                })
                .help("Spacing of seed pixels along the image border"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .required(false)
                .long(STRATEGY)
                .takes_value(true)
                .possible_values(&["dfs", "bfs"])
                .default_value("dfs")
                .help("Fill order among pixels with equal iteration counts"),
        )
        .arg(
            Arg::with_name(TIMEOUT)
                .required(false)
                .long(TIMEOUT)
                .takes_value(true)
                .default_value("3600")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        u64::max_value(),
                        "Could not parse timeout",
                        "Timeout must be positive",
                    )
                })
                .help("Seconds to wait for the render before writing what there is"),
        )
        .get_matches()
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, failure::Error> {
    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE).unwrap_or("640x480"), 'x')
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let mut config = RenderConfig::default()
        .with_size(width, height)
        .with_max_iterations(u32::from_str(matches.value_of(ITERATIONS).unwrap_or("2000"))?)
        .with_rounds_per_call(u32::from_str(matches.value_of(ROUNDS).unwrap_or("100"))?)
        .with_seed_stride(usize::from_str(matches.value_of(STRIDE).unwrap_or("10"))?)
        .with_strategy(
            Strategy::from_str(matches.value_of(STRATEGY).unwrap_or("dfs")).map_err(failure::err_msg)?,
        );
    if let Some(threads) = matches.value_of(THREADS) {
        config = config.with_workers(usize::from_str(threads)?);
    }
    Ok(config)
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();
    let matches = args();
    let config = config(&matches)?;

    let view = match (matches.value_of(CENTRE), matches.value_of(SIDE)) {
        (Some(centre), Some(side)) => {
            let (re, im) = parse_pair::<String>(centre, ',')
                .ok_or_else(|| failure::err_msg("Error parsing centre point"))?;
            View::centred(&re, &im, side, config.width, config.height)?
        }
        _ => View::home(config.width, config.height)?,
    };

    let mut controller = ViewController::with_view(config, view)?;
    if let Some(zooms) = matches.values_of(ZOOM) {
        for zoom in zooms {
            let selection = parse_selection(zoom)
                .ok_or_else(|| failure::err_msg("Error parsing zoom rectangle"))?;
            if !controller.zoom(&selection)? {
                eprintln!("Ignoring zoom {}: selection too narrow", zoom);
            }
        }
    }

    let timeout = u64::from_str(matches.value_of(TIMEOUT).unwrap_or("3600"))?;
    if !controller.wait_idle(Duration::from_secs(timeout))? {
        eprintln!("Render did not finish in {} seconds; writing what there is", timeout);
    }

    let stats = controller.stats()?;
    info!(
        "generation {}: {} escaped, {} bounded, {} digits",
        stats.generation,
        stats.escaped,
        stats.bounded,
        controller.precision().significant_digits()
    );

    let output = matches.value_of(OUTPUT).unwrap_or("floodbrot.png");
    let image = controller
        .snapshot()?
        .to_image()
        .ok_or_else(|| failure::err_msg("Image buffer does not match its dimensions"))?;
    image.save(output)?;
    println!(
        "{}: {}x{}, {} escaped, {} bounded",
        output,
        image.width(),
        image.height(),
        stats.escaped,
        stats.bounded
    );
    Ok(())
}
