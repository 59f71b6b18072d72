//! Terminal formatting shared by the subcommands.

#[cfg(feature = "colorized_output")]
use console::style;

/// Section heading with an underline
pub fn heading(text: &str) -> String {
    let rule = "=".repeat(text.chars().count());
    #[cfg(feature = "colorized_output")]
    {
        format!("{}\n{}", style(text).bold().cyan(), style(rule).cyan())
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        format!("{}\n{}", text, rule)
    }
}

/// Optional value with fixed precision, `-` when absent
pub fn value(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

/// Efficiency as a percentage, colored by how close it is to 100 %
pub fn efficiency(value: Option<f64>) -> String {
    let Some(v) = value else {
        return format!("{:>8}", "-");
    };
    let text = format!("{:>7.2}%", v * 100.0);
    #[cfg(feature = "colorized_output")]
    {
        if v >= 0.98 {
            style(text).green().to_string()
        } else if v >= 0.90 {
            style(text).yellow().to_string()
        } else {
            style(text).red().to_string()
        }
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        text
    }
}

/// Warning line for the batch report
pub fn warning(text: &str) -> String {
    #[cfg(feature = "colorized_output")]
    {
        format!("{}: {}", style("WARNING").yellow().bold(), text)
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        format!("WARNING: {}", text)
    }
}
