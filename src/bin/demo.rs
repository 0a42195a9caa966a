//! Voltage SLMP Demo
//!
//! Demonstrates the voltage_slmp library features including:
//! - ReadRandom request framing for all four frame kinds
//! - Response parsing and device value extraction
//! - Pseudo-dword splitting and bit expansion
//! - Live ReadRandom against a PLC (when one is reachable)
//!
//! Usage: cargo run --bin demo [plc_address] [3E|4E] [binary|ascii]
//! Example: cargo run --bin demo 192.168.3.39:5007 4E binary

use std::time::Duration;
use voltage_slmp::{
    BitExpansionUtility, ClientConfig, DeviceCode, DeviceDataExtractor, DeviceLimits,
    DeviceRequest, DeviceSpecification, DwordDevice, Encoding, FrameBuilder, FrameKind,
    PseudoDwordSplitter, ResponseParser, SlmpClient, SlmpTcpClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 {} Demo", voltage_slmp::info());
    println!("=============================\n");

    // =========================================================================
    // Part 1: Request framing (no connection required)
    // =========================================================================
    println!("📦 Part 1: ReadRandom request frames");
    println!("------------------------------------");

    let devices = vec![
        DeviceSpecification::new(DeviceCode::D, 100),
        DeviceSpecification::new(DeviceCode::W, 0x1A).with_hex_address(true),
        DeviceSpecification::new(DeviceCode::M, 16),
    ];

    for kind in FrameKind::ALL {
        let frame = FrameBuilder::new(kind)
            .sequence(7)
            .devices(devices.iter().copied())
            .build_read_random()?;
        let wire = frame.to_wire();
        if kind.is_ascii() {
            println!("  {:<10} {} chars: {}", kind, wire.len(), String::from_utf8_lossy(&wire));
        } else {
            println!("  {:<10} {} bytes: {}", kind, wire.len(), voltage_slmp::codec::bytes_to_hex(&wire));
        }
    }

    // =========================================================================
    // Part 2: Response parsing
    // =========================================================================
    println!("\n📨 Part 2: Response parsing");
    println!("---------------------------");

    let raw = b"D00000FF03FF00000C000012340ABC";
    let response = ResponseParser::parse_auto(raw)?;
    println!(
        "  kind={} end_code={} words={}",
        response.kind,
        response.end_code,
        response.word_count()
    );
    let pair = [
        DeviceSpecification::new(DeviceCode::D, 0),
        DeviceSpecification::new(DeviceCode::D, 1),
    ];
    for (key, value) in DeviceDataExtractor::extract(response.payload(), &pair)?.iter() {
        println!("    {} = {}", key, value);
    }

    let error_raw = b"D00000FF03FF000016C05900FF03FF0004030000";
    match ResponseParser::parse(error_raw, FrameKind::ThreeEAscii)?.into_result() {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  PLC rejected request: {}", e),
    }

    // =========================================================================
    // Part 3: Dwords and bits
    // =========================================================================
    println!("\n🔢 Part 3: Pseudo-dwords and bit expansion");
    println!("-------------------------------------------");

    let dwords = [DwordDevice::new(DeviceCode::D, 200, 0x1234_5678)];
    let pairs = PseudoDwordSplitter::split_dword_to_word_pairs(&dwords)?;
    for p in &pairs {
        println!(
            "  {} -> {}{}=0x{:04X}, {}{}=0x{:04X}",
            dwords[0], p.low.code, p.low.address, p.low.value, p.high.code, p.high.address, p.high.value
        );
    }
    let combined = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs)?;
    println!("  recombined: {}", combined[0]);

    let bits = BitExpansionUtility::expand_word_to_bits(0x0005);
    let on: Vec<usize> = bits.iter().enumerate().filter(|(_, &b)| b).map(|(i, _)| i).collect();
    println!("  0x0005 bits set: {:?}", on);

    // =========================================================================
    // Part 4: Live ReadRandom (requires a PLC)
    // =========================================================================
    println!("\n🔌 Part 4: TCP Client Operations");
    println!("---------------------------------");

    let plc_address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("127.0.0.1:{}", voltage_slmp::DEFAULT_SLMP_PORT));
    let version = std::env::args().nth(2).unwrap_or_else(|| "3E".to_string());
    let encoding: Encoding = match std::env::args().nth(3) {
        Some(text) => text.parse()?,
        None => Encoding::Binary,
    };
    let frame_kind = FrameKind::parse(&version, encoding)?;

    println!("  Connecting to {} ({})...", plc_address, frame_kind);

    let config = ClientConfig::new()
        .with_frame_kind(frame_kind)
        .with_timeout(Duration::from_secs(3));
    let mut client = match SlmpTcpClient::from_address(&plc_address, config).await {
        Ok(client) => {
            println!("  ✅ Connected successfully!");
            client
        }
        Err(e) => {
            println!("  ⚠️  Connection failed: {}", e);
            println!("  (This is expected if no PLC is reachable)");
            println!("\n🎉 Demo completed! (TCP operations skipped)");
            return Ok(());
        }
    };

    match client.read_random(&devices).await {
        Ok(values) => {
            for (key, value) in values.iter() {
                println!("    {} = {}", key, value);
            }
        }
        Err(e) => println!("    ReadRandom error: {}", e),
    }

    let requests = [
        DeviceRequest::Word(DeviceSpecification::new(DeviceCode::D, 100)),
        DeviceRequest::Dword(DeviceSpecification::new(DeviceCode::D, 200)),
        DeviceRequest::Bits(DeviceSpecification::new(DeviceCode::M, 0)),
    ];
    match client.read_random_mixed(&requests, &DeviceLimits::new()).await {
        Ok(values) => println!("    Mixed read returned {} values", values.len()),
        Err(e) => println!("    Mixed read error: {}", e),
    }

    let stats = client.get_stats();
    println!("\n  📊 Statistics:");
    println!("    Requests: {}, Responses: {}", stats.requests_sent, stats.responses_received);
    println!("    Bytes sent: {}, received: {}", stats.bytes_sent, stats.bytes_received);

    if let Err(e) = client.close().await {
        eprintln!("  ⚠️  Close error: {}", e);
    }

    println!("\n🎉 Demo completed!");
    Ok(())
}
