//! Sensorboard CLI
//!
//! Command-line client for a running Sensorboard server:
//! - Push readings
//! - Inspect sensors, statistics and the dashboard
//! - Hide and unhide sensors
//! - Check status

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use sensorboard::aggregator::{AggregateStore, ReadingBatch, SensorReading};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sensorboard-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the Sensorboard sensor aggregation server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push a single reading
    Push {
        /// Sensor name
        name: String,
        /// Temperature
        temp: f64,
        /// Humidity
        hum: f64,
        /// Region label
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Push readings from a JSON file (one reading or an array)
    PushFile {
        /// Path to the JSON file
        path: PathBuf,
    },

    /// List all sensors with their latest values
    List,

    /// Show one sensor with its recent history
    Show {
        /// Sensor name
        name: String,
        /// Show the whole history window
        #[arg(long)]
        all: bool,
    },

    /// Show statistics for one sensor
    Stats {
        /// Sensor name
        name: String,
    },

    /// Show visible sensors grouped by region
    Dashboard {
        /// Only this region
        #[arg(short, long)]
        region: Option<String>,
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Hide a sensor from the dashboard
    Hide {
        /// Sensor name
        name: String,
    },

    /// Show a hidden sensor again
    Unhide {
        /// Sensor name
        name: String,
    },

    /// List hidden sensors
    Hidden,

    /// Delete all sensor data
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show server status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let json_output = cli.format == "json";
    let api = cli.api_url.trim_end_matches('/');

    match cli.command {
        Commands::Push {
            name,
            temp,
            hum,
            region,
        } => {
            let mut reading = SensorReading::new(&name, temp, hum);
            if let Some(region) = region {
                reading = reading.region(region);
            }

            let body = push(&client, api, &reading.into()).await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Pushed {}: {:.1} C, {:.1} %", name, temp, hum);
            }
        }

        Commands::PushFile { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let batch: ReadingBatch = serde_json::from_str(&content)
                .with_context(|| format!("Invalid readings in {:?}", path))?;

            let body = push(&client, api, &batch).await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!(
                    "Pushed {} readings ({})",
                    body["accepted"].as_u64().unwrap_or(0),
                    body["status"].as_str().unwrap_or("unknown")
                );
            }
        }

        Commands::List => {
            let response = check(client.get(format!("{}/api/v1/sensors", api)).send().await?).await?;
            let sensors: AggregateStore = response.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&sensors)?);
            } else if sensors.is_empty() {
                println!("No sensors yet.");
                println!();
                println!("Push your first reading with:");
                println!("  sensorboard-cli push greenhouse 24.5 61");
            } else {
                println!(
                    "{:<20} {:>8} {:>8} {:<15} {:>8}",
                    "Name", "Temp", "Hum", "Region", "Points"
                );
                println!("{}", "-".repeat(63));

                for (name, state) in &sensors {
                    println!(
                        "{:<20} {:>8.1} {:>8.1} {:<15} {:>8}",
                        name,
                        state.temp,
                        state.hum,
                        state.region,
                        state.history.len()
                    );
                }
            }
        }

        Commands::Show { name, all } => {
            let mut url = sensor_url(api, &name);
            if all {
                url.push_str("?all=true");
            }
            let detail: serde_json::Value = check(client.get(url).send().await?).await?.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!("{}", name);
                println!("  Region:      {}", detail["region"].as_str().unwrap_or("-"));
                println!(
                    "  Temperature: {:.1} C ({})",
                    detail["temp"].as_f64().unwrap_or(0.0),
                    detail["band"].as_str().unwrap_or("-")
                );
                println!("  Humidity:    {:.1} %", detail["hum"].as_f64().unwrap_or(0.0));
                println!();
                print_history(&detail["recent"]);
            }
        }

        Commands::Stats { name } => {
            let url = format!("{}/stats", sensor_url(api, &name));
            let stats: serde_json::Value = check(client.get(url).send().await?).await?.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{:<12} {:>8} {:>8} {:>8}", name, "Avg", "Min", "Max");
                println!("{}", "-".repeat(39));
                println!(
                    "{:<12} {:>8.2} {:>8.2} {:>8.2}",
                    "Temperature",
                    stats["avgTemp"].as_f64().unwrap_or(0.0),
                    stats["minTemp"].as_f64().unwrap_or(0.0),
                    stats["maxTemp"].as_f64().unwrap_or(0.0)
                );
                println!(
                    "{:<12} {:>8.2} {:>8.2} {:>8.2}",
                    "Humidity",
                    stats["avgHum"].as_f64().unwrap_or(0.0),
                    stats["minHum"].as_f64().unwrap_or(0.0),
                    stats["maxHum"].as_f64().unwrap_or(0.0)
                );
            }
        }

        Commands::Dashboard { region, search } => {
            let mut query = Vec::new();
            if let Some(region) = &region {
                query.push(("region", region.as_str()));
            }
            if let Some(search) = &search {
                query.push(("search", search.as_str()));
            }

            let response = client
                .get(format!("{}/api/v1/dashboard", api))
                .query(&query)
                .send()
                .await?;
            let groups: Vec<serde_json::Value> = check(response).await?.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else if groups.is_empty() {
                println!("No visible sensors.");
            } else {
                for group in &groups {
                    println!("{}", group["region"].as_str().unwrap_or("-"));
                    for card in group["sensors"].as_array().into_iter().flatten() {
                        println!(
                            "  {:<20} {:>8.1} {:>8.1}  {}",
                            card["name"].as_str().unwrap_or("-"),
                            card["temp"].as_f64().unwrap_or(0.0),
                            card["hum"].as_f64().unwrap_or(0.0),
                            card["band"].as_str().unwrap_or("-")
                        );
                    }
                }
            }
        }

        Commands::Hide { name } => {
            let url = format!("{}/api/v1/hidden/{}", api, urlencoding::encode(&name));
            let body: serde_json::Value = check(client.post(url).send().await?).await?.json().await?;
            print_hidden(&body, json_output, Some(&format!("Hid {}", name)))?;
        }

        Commands::Unhide { name } => {
            let url = format!("{}/api/v1/hidden/{}", api, urlencoding::encode(&name));
            let body: serde_json::Value = check(client.delete(url).send().await?).await?.json().await?;
            print_hidden(&body, json_output, Some(&format!("Unhid {}", name)))?;
        }

        Commands::Hidden => {
            let response = client.get(format!("{}/api/v1/hidden", api)).send().await?;
            let body: serde_json::Value = check(response).await?.json().await?;
            print_hidden(&body, json_output, None)?;
        }

        Commands::Clear { yes } => {
            if !yes && !confirm("Delete all sensor data?")? {
                println!("Aborted.");
                return Ok(());
            }

            check(client.delete(format!("{}/api/v1/sensors", api)).send().await?).await?;
            println!("All sensor data cleared.");
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", api)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    if json_output {
                        println!("{}", serde_json::to_string_pretty(&health)?);
                        return Ok(());
                    }

                    println!(
                        "Sensorboard v{}",
                        health["version"].as_str().unwrap_or(env!("CARGO_PKG_VERSION"))
                    );
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Storage:    {}", health["storage"].as_str().unwrap_or("unknown"));
                    println!("Sensors:    {}", health["sensors"].as_u64().unwrap_or(0));
                    println!("Hidden:     {}", health["hidden"].as_u64().unwrap_or(0));
                    println!("WebSockets: {}", health["ws_connections"].as_u64().unwrap_or(0));

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Sensorboard API at {}", api);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin sensorboard");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// POST a batch to the ingest endpoint
async fn push(client: &Client, api: &str, batch: &ReadingBatch) -> Result<serde_json::Value> {
    let response = client
        .post(format!("{}/api/v1/ingest", api))
        .json(batch)
        .send()
        .await?;
    Ok(check(response).await?.json().await?)
}

/// Turn a non-success response into an error carrying the server's message
async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);

    bail!("Request failed ({}): {}", status, message)
}

fn sensor_url(api: &str, name: &str) -> String {
    format!("{}/api/v1/sensors/{}", api, urlencoding::encode(name))
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_history(points: &serde_json::Value) {
    let points = match points.as_array() {
        Some(p) if !p.is_empty() => p,
        _ => {
            println!("No history");
            return;
        }
    };

    println!("{:<20} {:>8} {:>8}", "Time", "Temp", "Hum");
    println!("{}", "-".repeat(38));

    for point in points {
        println!(
            "{:<20} {:>8.1} {:>8.1}",
            format_timestamp(point["timestamp"].as_i64().unwrap_or(0)),
            point["temp"].as_f64().unwrap_or(0.0),
            point["hum"].as_f64().unwrap_or(0.0)
        );
    }
}

fn print_hidden(body: &serde_json::Value, json_output: bool, action: Option<&str>) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(body)?);
        return Ok(());
    }

    if let Some(action) = action {
        match body["changed"].as_bool() {
            Some(false) => println!("{} (no change)", action),
            _ => println!("{}", action),
        }
    }

    let hidden: Vec<&str> = body["hidden"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .collect();

    if hidden.is_empty() {
        println!("No hidden sensors.");
    } else {
        println!("Hidden: {}", hidden.join(", "));
    }
    Ok(())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_url_encodes_name() {
        assert_eq!(
            sensor_url("http://localhost:8082", "Sala de estar"),
            "http://localhost:8082/api/v1/sensors/Sala%20de%20estar"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7260), "2h 1m");
        assert_eq!(format_duration(90000), "1d 1h");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from([
            "sensorboard-cli",
            "--format",
            "json",
            "push",
            "greenhouse",
            "24.5",
            "61",
            "--region",
            "Norte",
        ])
        .unwrap();

        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Push { name, temp, region, .. } => {
                assert_eq!(name, "greenhouse");
                assert_eq!(temp, 24.5);
                assert_eq!(region.as_deref(), Some("Norte"));
            }
            _ => panic!("expected push"),
        }
    }
}
