use crate::chunk::{render, LogChunk};

/// Build the analysis prompt around the rendered chunks.
pub fn build_prompt(chunks: &[LogChunk], language: &str) -> String {
    let logs = render(chunks);
    format!(
        r#"You are an Apple hardware technician and forensic log analyst.
The excerpt below comes from an iPad/iPhone "sysdiagnose" bundle. The goal is to find a lost Apple Pencil.

Analyse the Bluetooth and system log lines. Pencil information may not appear as explicit
"Connected" or "Disconnected" events. Look for subtler clues:
1. statedump: a snapshot of device state at a point in time.
2. LastSeen: a timestamp or uptime tick of the last detected advertisement.
3. GAPName: the device name, e.g. "Apple Pencil Pro" or "ApplePencil".
4. Axxxx model codes such as A2538 or A2051.

Example line:
`statedump: ... -> ... GAPName: "Apple Pencil Pro", LastSeen: 25946174, LastConn: 314488 ...`

Determine:
1. Last seen time: the latest exact time from timestamps, LastSeen fields or context. If LastSeen is relative, convert it using absolute times elsewhere in the log.
2. Signal strength: look for RSSI values; with only statedumps, describe any signal quality hints.
3. Device context: what was the iPad doing, and was the Pencil "Paired" (paired but disconnected) or "Connected"?
4. Battery: if recorded.

Log content:
{logs}

Answer in {language}.
Output strictly as JSON matching the response schema."#
    )
}
