use crate::control_system::direction::Direction;
use crate::global_variables::{AMQP_URL, QUEUE_PHASE_EVENTS};
use crate::shared_data::{current_timestamp, PhaseRecord};
use amiquip::{
    Connection, ConsumerMessage, ConsumerOptions, Exchange, QueueDeclareOptions,
    Result as AmiquipResult,
};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{stdin, stdout, Write};
use std::path::Path;

// Listens to the "phase_events" queue and logs each incoming record.
pub async fn listen_phase_events() -> AmiquipResult<()> {
    tokio::task::spawn_blocking(|| -> AmiquipResult<()> {
        let mut connection = Connection::insecure_open(AMQP_URL)?;
        let channel = connection.open_channel(None)?;
        let _exchange = Exchange::direct(&channel);
        let queue = channel.queue_declare(QUEUE_PHASE_EVENTS, QueueDeclareOptions::default())?;
        let consumer = queue.consume(ConsumerOptions::default())?;
        println!("[SignalMonitor] Listening for phase events...");
        for message in consumer.receiver() {
            match message {
                ConsumerMessage::Delivery(delivery) => {
                    let ts = current_timestamp();
                    if let Ok(json_str) = std::str::from_utf8(&delivery.body) {
                        let record: PhaseRecord =
                            serde_json::from_str(json_str).unwrap_or(PhaseRecord {
                                timestamp: ts,
                                direction: "unknown".to_string(),
                                duration_secs: 0,
                                is_emergency: false,
                            });
                        log_phase_record(record);
                    }
                    consumer.ack(delivery)?;
                }
                other => {
                    println!("[SignalMonitor] Phase event consumer ended: {:?}", other);
                    break;
                }
            }
        }
        connection.close()
    })
    .await
    .unwrap()
}

// Generic helper to log a record to a CSV file.
fn log_to_csv<T: Serialize>(filename: &str, record: &T) -> Result<(), Box<dyn Error>> {
    let file_exists = Path::new(filename).exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(filename)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

pub fn log_phase_record(record: PhaseRecord) {
    if let Err(e) = log_to_csv("phase_events.csv", &record) {
        eprintln!("Error logging phase record: {}", e);
    }
}

fn read_phase_records(filename: &str) -> Result<Vec<PhaseRecord>, Box<dyn Error>> {
    let mut rdr = csv::Reader::from_path(filename)?;
    Ok(rdr.deserialize().filter_map(Result::ok).collect())
}

// Total green seconds granted to each approach, ignoring unparseable rows.
fn green_totals(records: &[PhaseRecord]) -> HashMap<Direction, u64> {
    let mut totals = HashMap::new();
    for record in records {
        if let Some(direction) = Direction::parse(&record.direction) {
            *totals.entry(direction).or_insert(0) += record.duration_secs;
        }
    }
    totals
}

// Reads and displays records from "phase_events.csv".
pub fn show_phase_history() -> Result<(), Box<dyn Error>> {
    let records = read_phase_records("phase_events.csv")?;
    println!("Phase History:");
    for record in records {
        println!("{:?}", record);
    }
    Ok(())
}

// Option 2: Display report summary with per-approach green totals.
pub fn generate_report_summary() -> Result<(), Box<dyn Error>> {
    println!("Generating Report Summary...");
    let records = read_phase_records("phase_events.csv")?;
    let totals = green_totals(&records);
    let emergency_count = records.iter().filter(|r| r.is_emergency).count();
    println!("Report Summary:");
    println!("Phases served: {} records", records.len());
    println!("Emergency phases: {}", emergency_count);
    for direction in Direction::ROTATION {
        println!(
            "Green time for {}: {} seconds",
            direction,
            totals.get(&direction).copied().unwrap_or(0)
        );
    }
    Ok(())
}

// Option 3: Show green time per approach as a bar chart using Plotters.
pub fn show_green_time_chart() -> Result<(), Box<dyn Error>> {
    let records = read_phase_records("phase_events.csv")?;
    if records.is_empty() {
        println!("No phase data available.");
        return Ok(());
    }
    let totals = green_totals(&records);
    let max_total = totals.values().copied().max().unwrap_or(0);

    let (image_width, image_height) = (640, 480);
    let margin = 40;
    let chart_height = image_height - 2 * margin;
    let bar_slot = (image_width - 2 * margin) / Direction::ROTATION.len() as i32;
    let bar_width = bar_slot / 2;

    let backend = BitMapBackend::new(
        "green_time_by_direction.png",
        (image_width as u32, image_height as u32),
    );
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    for (i, direction) in Direction::ROTATION.iter().enumerate() {
        let total = totals.get(direction).copied().unwrap_or(0);
        let bar_height = if max_total == 0 {
            0
        } else {
            (chart_height as u64 * total / max_total) as i32
        };
        let x0 = margin + i as i32 * bar_slot + bar_slot / 4;
        let y1 = image_height - margin;
        let y0 = y1 - bar_height;

        root.draw(&Rectangle::new(
            [(x0, y0), (x0 + bar_width, y1)],
            BLUE.filled(),
        ))?;
        root.draw(&Rectangle::new([(x0, y0), (x0 + bar_width, y1)], &BLACK))?;

        let text = format!("{}: {}s", direction, total);
        root.draw(&Text::new(
            text,
            (x0 + bar_width / 2, y1 + 5),
            TextStyle::from(("sans-serif", 15).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    root.present()?;
    println!("Green time chart saved to green_time_by_direction.png");
    Ok(())
}

pub async fn run_cli() {
    loop {
        println!("\nSignal Monitor Admin CLI");
        println!("1. Display Phase History");
        println!("2. Generate Report Summary");
        println!("3. Show Green Time Chart");
        println!("4. Exit");
        print!("Enter your choice: ");
        stdout().flush().unwrap();
        let mut input = String::new();
        stdin().read_line(&mut input).unwrap();
        let choice = input.trim().parse::<u32>().unwrap_or(0);
        match choice {
            1 => {
                if let Err(e) = show_phase_history() {
                    eprintln!("Error displaying phase history: {}", e);
                }
            }
            2 => {
                if let Err(e) = generate_report_summary() {
                    eprintln!("Error generating report summary: {}", e);
                }
            }
            3 => {
                if let Err(e) = show_green_time_chart() {
                    eprintln!("Error generating green time chart: {}", e);
                }
            }
            4 => {
                println!("Exiting CLI.");
                break;
            }
            _ => {
                println!("Invalid choice. Try again.");
            }
        }
    }
}
