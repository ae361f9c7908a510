use crate::models::Timeframe;

pub fn run() {
    for timeframe in Timeframe::all() {
        println!(
            "{:>4}  {:>6} min",
            timeframe.as_str(),
            timeframe.duration().num_minutes()
        );
    }
}
