use std::env;
use std::io;
use std::process;

use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use parm::config::{
    Parameters, BIN_WIDTH_DEFAULT, MAX_HEAP_SIZE_DEFAULT, NUM_GROUPS_DEFAULT,
    NUM_REDUCERS_DEFAULT, SPLIT_PATTERN_DEFAULT, TASK_ATTEMPTS_DEFAULT,
};

pub struct Arguments {
    pub params: Parameters,
    pub verbose: bool,
}

pub fn parse_args_or_exit() -> Arguments {
    let mut input_file_path = String::new();
    let mut output_path = String::new();
    let mut discretize = String::new();
    let mut min_support: f64 = 0.0;
    let mut min_confidence: Option<f64> = None;
    let mut num_groups = NUM_GROUPS_DEFAULT;
    let mut max_heap_size = MAX_HEAP_SIZE_DEFAULT;
    let mut split_pattern = SPLIT_PATTERN_DEFAULT.to_owned();
    let mut num_reducers = NUM_REDUCERS_DEFAULT;
    let mut task_attempts = TASK_ATTEMPTS_DEFAULT;
    let mut bin_width = BIN_WIDTH_DEFAULT;
    let mut verbose = false;
    {
        let mut parser = ArgumentParser::new();
        parser.set_description(
            "Parallel FP-Growth frequent itemset and association rule miner.",
        );

        parser
            .refer(&mut input_file_path)
            .add_argument("input", Store, "Input dataset, one transaction per line.")
            .required();

        parser
            .refer(&mut output_path)
            .add_argument(
                "output",
                Store,
                "Directory in which to store the output of every stage.",
            )
            .required();

        parser
            .refer(&mut discretize)
            .add_argument(
                "discretize",
                Store,
                "Whether to discretize columns before mining, 'true' or 'false'.",
            )
            .required();

        parser
            .refer(&mut min_support)
            .add_argument(
                "min_support",
                Store,
                "Minimum itemset support threshold, in range [0,1].",
            )
            .required();

        parser.refer(&mut min_confidence).add_argument(
            "min_confidence",
            StoreOption,
            "Minimum rule confidence threshold, in range [0,1]. \
             Rules are only mined when given.",
        );

        parser
            .refer(&mut num_groups)
            .add_option(&["--num-groups"], Store, "Number of item groups to mine in parallel.")
            .metavar("count");

        parser
            .refer(&mut max_heap_size)
            .add_option(
                &["--max-heap-size"],
                Store,
                "Maximum number of closed patterns kept per item.",
            )
            .metavar("count");

        parser
            .refer(&mut split_pattern)
            .add_option(
                &["--split-pattern"],
                Store,
                "Regular expression separating the items of a transaction.",
            )
            .metavar("regex");

        parser
            .refer(&mut num_reducers)
            .add_option(&["--reducers"], Store, "Number of reduce partitions per stage.")
            .metavar("count");

        parser
            .refer(&mut task_attempts)
            .add_option(
                &["--task-attempts"],
                Store,
                "Number of times a failed task is attempted before the stage fails.",
            )
            .metavar("count");

        parser
            .refer(&mut bin_width)
            .add_option(
                &["--bin-width"],
                Store,
                "Width of the bins numeric values fall into when discretizing.",
            )
            .metavar("width");

        parser
            .refer(&mut verbose)
            .add_option(&["-v", "--verbose"], StoreTrue, "Log per task detail.");

        if env::args().count() == 1 {
            let _ = parser.print_help("Usage:", &mut io::stderr());
            process::exit(1);
        }

        match parser.parse_args() {
            Ok(()) => {}
            Err(err) => {
                process::exit(err);
            }
        }
    }

    let enable_discretization = match discretize.as_ref() {
        "true" => true,
        "false" => false,
        _ => {
            eprintln!("Error: discretize must be either 'true' or 'false'");
            process::exit(1);
        }
    };

    let mut params = Parameters::new(input_file_path, output_path, min_support);
    params.min_confidence = min_confidence;
    params.num_groups = num_groups;
    params.max_heap_size = max_heap_size;
    params.enable_discretization = enable_discretization;
    params.split_pattern = split_pattern;
    params.num_reducers = num_reducers;
    params.task_attempts = task_attempts;
    params.bin_width = bin_width;

    Arguments { params, verbose }
}
