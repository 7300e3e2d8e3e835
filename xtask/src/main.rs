use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use serde_json::json;
use spectrum_rs::signal::{bandwidth, magnitude_spectrum, phase_spectrum, DEFAULT_CUTOFF_DB};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_PYTHON_BIN: &str = "python";
const ITERS: usize = 200;

const PY_SPECTRUM_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

x = np.asarray(p["x"], dtype=float)
dt = float(p["dt"])

def _magnitude(signal, db):
    num = signal.shape[-1]
    num_freqs = (num + 1) // 2
    freqs = np.fft.fftfreq(num, dt)[:num_freqs]
    comps = np.fft.fft(signal, axis=-1, norm="forward")
    mag = np.abs(comps)
    out = np.empty(signal.shape[:-1] + (num_freqs,))
    out[..., 0] = mag[..., 0]
    if num_freqs > 1:
        out[..., 1:] = mag[..., 1:num_freqs] + mag[..., -num_freqs + 1:][..., ::-1]
    if db:
        peak = np.max(out, axis=-1, keepdims=True)
        out = 20 * np.log10((out + 1e-31) / (peak + 1e-31))
    return freqs, out

def _phase(signal):
    num = signal.shape[-1]
    num_freqs = num // 2 if num % 2 == 0 else (num + 1) // 2
    comps = np.fft.fft(signal, axis=-1).take(range(num_freqs), axis=-1)
    angle = np.angle(comps)
    return np.where(angle <= -np.pi, np.pi, angle)

def _bandwidth(signal, cutoff):
    freqs, spec = _magnitude(signal, True)
    if spec.ndim > 1:
        spec = np.mean(spec, axis=0)
    num_freqs = spec.shape[-1]
    f_min = 0.0
    for f in range(num_freqs):
        if spec[f] > cutoff:
            f_min = freqs[f]
            break
    f_centre = freqs[np.argmax(spec)]
    f_max = float(num_freqs)
    for f in reversed(range(num_freqs)):
        if spec[f] > cutoff:
            f_max = freqs[f]
            break
    return np.asarray([f_min, f_centre, f_max])

def _compute():
    if op == "magnitude":
        return _magnitude(x, bool(p["db"]))[1]
    if op == "phase":
        return _phase(x)
    if op == "bandwidth":
        return _bandwidth(x, float(p["cutoff"]))
    raise RuntimeError(f"unsupported op: {op}")

y = np.asarray(_compute(), dtype=float).reshape(-1)

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": y.tolist(),
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__
}))
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    output: Vec<f64>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    len: usize,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    rust_ns: f64,
    python_ns: f64,
    speedup_vs_python: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    rows: Vec<ContractRow>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

/// Damped multi-tone test signal, one row per batch entry.
fn test_batch(rows: usize, n: usize, dt: f64) -> Array2<f64> {
    Array2::from_shape_fn((rows, n), |(r, i)| {
        let t = i as f64 * dt;
        let f0 = 40.0 + 25.0 * r as f64;
        (-2.0 * t).exp() * (2.0 * std::f64::consts::PI * f0 * t).sin()
            + 0.3 * (2.0 * std::f64::consts::PI * 3.1 * f0 * t + 0.7).cos()
    })
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let python_bin = detect_python_bin();
    let versions = python_versions(&python_bin)?;
    info!(
        python = %versions.python_version,
        numpy = %versions.numpy_version,
        "using python reference"
    );

    let dt = 1e-3;
    let mut rows = Vec::new();

    for n in [1000usize, 1001] {
        let single: Array1<f64> = test_batch(1, n, dt).index_axis_move(Axis(0), 0);
        let batch = test_batch(4, n, dt);

        for db in [false, true] {
            let case_id = format!("magnitude_{}_n{n}", if db { "db" } else { "linear" });
            let (_, candidate) = magnitude_spectrum(&single, dt, db)
                .map_err(|e| anyhow!("{case_id} candidate execution failed: {e}"))?;
            let rust_ns = benchmark_avg_ns(ITERS, || {
                magnitude_spectrum(&single, dt, db)
                    .map(|_| ())
                    .map_err(|e| anyhow!("{case_id} candidate benchmark failed: {e}"))
            })?;
            let py = python_spectrum_eval(
                &python_bin,
                "magnitude",
                json!({ "x": single.to_vec(), "dt": dt, "db": db }),
                ITERS,
            )?;
            record_case(&mut rows, &case_id, candidate.to_vec(), py, rust_ns)?;
        }

        {
            let case_id = format!("magnitude_db_batch4_n{n}");
            let (_, candidate) = magnitude_spectrum(&batch, dt, true)
                .map_err(|e| anyhow!("{case_id} candidate execution failed: {e}"))?;
            let rust_ns = benchmark_avg_ns(ITERS, || {
                magnitude_spectrum(&batch, dt, true)
                    .map(|_| ())
                    .map_err(|e| anyhow!("{case_id} candidate benchmark failed: {e}"))
            })?;
            let py = python_spectrum_eval(
                &python_bin,
                "magnitude",
                json!({ "x": rows_of(&batch), "dt": dt, "db": true }),
                ITERS,
            )?;
            record_case(&mut rows, &case_id, flatten(&candidate), py, rust_ns)?;
        }

        {
            let case_id = format!("phase_batch4_n{n}");
            let (_, candidate) = phase_spectrum(&batch, dt)
                .map_err(|e| anyhow!("{case_id} candidate execution failed: {e}"))?;
            let rust_ns = benchmark_avg_ns(ITERS, || {
                phase_spectrum(&batch, dt)
                    .map(|_| ())
                    .map_err(|e| anyhow!("{case_id} candidate benchmark failed: {e}"))
            })?;
            let py = python_spectrum_eval(
                &python_bin,
                "phase",
                json!({ "x": rows_of(&batch), "dt": dt }),
                ITERS,
            )?;
            record_case(&mut rows, &case_id, flatten(&candidate), py, rust_ns)?;
        }

        for cutoff in [DEFAULT_CUTOFF_DB, -3.0, 1.0] {
            let case_id = format!("bandwidth_batch4_n{n}_cutoff{cutoff}");
            let band = bandwidth(&batch, dt, cutoff)
                .map_err(|e| anyhow!("{case_id} candidate execution failed: {e}"))?;
            let rust_ns = benchmark_avg_ns(ITERS, || {
                bandwidth(&batch, dt, cutoff)
                    .map(|_| ())
                    .map_err(|e| anyhow!("{case_id} candidate benchmark failed: {e}"))
            })?;
            let py = python_spectrum_eval(
                &python_bin,
                "bandwidth",
                json!({ "x": rows_of(&batch), "dt": dt, "cutoff": cutoff }),
                ITERS,
            )?;
            let (f_min, f_centre, f_max): (f64, f64, f64) = band.into();
            record_case(&mut rows, &case_id, vec![f_min, f_centre, f_max], py, rust_ns)?;
        }
    }

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version: versions.python_version,
        numpy_version: versions.numpy_version,
        rows,
    };

    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(&bundle).context("serializing summary bundle")?,
    )
    .context("writing summary.json")?;

    info!(
        dir = %out_dir.display(),
        cases = bundle.rows.len(),
        "contract reports written"
    );
    Ok(())
}

fn rows_of(x: &Array2<f64>) -> Vec<Vec<f64>> {
    x.outer_iter().map(|row| row.to_vec()).collect()
}

fn flatten(x: &Array2<f64>) -> Vec<f64> {
    x.iter().copied().collect()
}

fn detect_python_bin() -> PathBuf {
    std::env::var_os("PYTHON")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PYTHON_BIN))
}

fn python_versions(python_bin: &Path) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        r#"
import json, sys
import numpy
payload = json.loads(sys.stdin.read())
print(json.dumps({
    "output": [],
    "avg_ns": 0.0,
    "python_version": sys.version.split()[0],
    "numpy_version": numpy.__version__
}))
"#,
        json!({}),
    )
}

fn python_spectrum_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        PY_SPECTRUM_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
}

fn run_python_eval(
    python_bin: &Path,
    script: &str,
    payload: serde_json::Value,
) -> Result<PythonEval> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    let stdout = String::from_utf8(output.stdout).context("parsing python stdout utf8")?;
    let parsed: PythonEval = serde_json::from_str(stdout.trim()).context("parsing python json")?;
    Ok(parsed)
}

fn record_case(
    rows: &mut Vec<ContractRow>,
    case_id: &str,
    candidate: Vec<f64>,
    py: PythonEval,
    rust_ns: f64,
) -> Result<()> {
    ensure_same_length(case_id, &candidate, &py.output)?;

    let row = ContractRow {
        case_id: case_id.to_string(),
        len: candidate.len(),
        mae: mean_abs_error(&candidate, &py.output),
        rmse: root_mean_squared_error(&candidate, &py.output),
        max_abs: max_abs_error(&candidate, &py.output),
        rust_ns,
        python_ns: py.avg_ns,
        speedup_vs_python: py.avg_ns / rust_ns,
    };
    if row.max_abs > 1e-6 {
        warn!(case = case_id, max_abs = row.max_abs, "candidate diverges from numpy");
    } else {
        info!(case = case_id, max_abs = row.max_abs, "case recorded");
    }
    rows.push(row);
    Ok(())
}

fn ensure_same_length(case_id: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        bail!(
            "case {case_id} has mismatched output lengths: left={}, right={}",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

fn mean_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / a.len() as f64
}

fn root_mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    (a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64)
        .sqrt()
}

fn max_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,len,mae,rmse,max_abs,rust_ns,python_ns,speedup_vs_python\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{:.12},{:.12},{:.12},{:.3},{:.3},{:.6}\n",
            row.case_id,
            row.len,
            row.mae,
            row.rmse,
            row.max_abs,
            row.rust_ns,
            row.python_ns,
            row.speedup_vs_python
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
