//! Playwright integration for headless browser automation.
//!
//! This module contains the inline Playwright scripts, error mapping,
//! and availability checks for Node.js and Playwright.

use crate::capture::CaptureError;
use crate::{Result, SdumpError};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Serializes the loaded page into the page-model JSON consumed by
/// [`PageModel`](crate::page::PageModel).
///
/// argv: url, width, height, scale, navMs, idleMs, headless, inspectSelector
pub(crate) const PAGE_MODEL_SCRIPT: &str = r#"
const [, url, width, height, scale, navTimeout, idleTimeout, headlessFlag, inspectSelector] = process.argv;

function serializePage(inspectSelector) {
  const elements = [];
  const index = new Map();
  const mediaQueries = {};
  const supportsQueries = {};

  function styleMap(style) {
    const out = {};
    if (!style) return out;
    for (let i = 0; i < style.length; i++) {
      const name = style[i];
      out[name] = style.getPropertyValue(name);
    }
    return out;
  }

  function declarations(style) {
    const out = [];
    if (!style) return out;
    for (let i = 0; i < style.length; i++) {
      const name = style[i];
      out.push({
        property: name,
        value: style.getPropertyValue(name),
        important: style.getPropertyPriority(name) === 'important'
      });
    }
    return out;
  }

  function visit(el, parent) {
    const id = elements.length;
    index.set(el, id);
    const attributes = {};
    for (const attr of el.attributes) {
      attributes[attr.name] = attr.value;
    }
    const record = {
      tag: el.localName,
      attributes,
      parent,
      children: [],
      inlineStyle: declarations(el.style),
      computedStyle: styleMap(getComputedStyle(el)),
      pseudoStyles: {
        '::before': styleMap(getComputedStyle(el, '::before')),
        '::after': styleMap(getComputedStyle(el, '::after'))
      }
    };
    elements.push(record);
    for (const child of el.childNodes) {
      if (child.nodeType === Node.ELEMENT_NODE) {
        record.children.push({ element: visit(child, id) });
      } else if (child.nodeType === Node.TEXT_NODE || child.nodeType === Node.CDATA_SECTION_NODE) {
        record.children.push({ text: child.data });
      }
    }
    return id;
  }

  function convertRules(list) {
    return Array.from(list || []).map(convertRule);
  }

  function convertRule(rule) {
    if (rule instanceof CSSStyleRule) {
      return {
        type: 'style',
        selectorText: rule.selectorText,
        style: { declarations: declarations(rule.style), cssText: rule.style.cssText }
      };
    }
    if (rule instanceof CSSMediaRule) {
      const condition = rule.conditionText !== undefined ? rule.conditionText : rule.media.mediaText;
      if (!(condition in mediaQueries)) {
        try { mediaQueries[condition] = window.matchMedia(condition).matches; } catch (_) {}
      }
      return { type: 'conditional', kind: 'media', condition, rules: convertRules(rule.cssRules) };
    }
    if (typeof CSSSupportsRule !== 'undefined' && rule instanceof CSSSupportsRule) {
      const condition = rule.conditionText;
      if (!(condition in supportsQueries)) {
        try { supportsQueries[condition] = CSS.supports(condition); } catch (_) {}
      }
      return { type: 'conditional', kind: 'supports', condition, rules: convertRules(rule.cssRules) };
    }
    if (rule.cssRules) {
      return { type: 'group', rules: convertRules(rule.cssRules) };
    }
    return { type: 'other' };
  }

  function probeBaseline(tags) {
    const baseline = {};
    const frame = document.createElement('iframe');
    frame.setAttribute('aria-hidden', 'true');
    frame.style.cssText = 'position:absolute;left:-10000px;top:0;width:1px;height:1px;border:0;visibility:hidden;';
    document.documentElement.appendChild(frame);
    try {
      const doc = frame.contentDocument;
      doc.open();
      doc.write('<!DOCTYPE html><html><head></head><body></body></html>');
      doc.close();
      const win = frame.contentWindow;
      for (const tag of tags) {
        let probe;
        try { probe = doc.createElement(tag); } catch (_) { continue; }
        doc.body.appendChild(probe);
        baseline[tag] = styleMap(win.getComputedStyle(probe));
        baseline[tag + '|::before'] = styleMap(win.getComputedStyle(probe, '::before'));
        baseline[tag + '|::after'] = styleMap(win.getComputedStyle(probe, '::after'));
        probe.remove();
      }
    } finally {
      frame.remove();
    }
    return baseline;
  }

  const root = document.documentElement;
  visit(root, null);

  const styleSheets = Array.from(document.styleSheets).map((sheet) => {
    try {
      return { href: sheet.href, rules: convertRules(sheet.cssRules) };
    } catch (err) {
      return { href: sheet.href, error: String((err && err.message) || err) };
    }
  });

  let inspected = null;
  if (inspectSelector) {
    const target = document.querySelector(inspectSelector);
    inspected = target && index.has(target) ? index.get(target) : null;
  }

  const tags = Array.from(new Set(elements.map((e) => e.tag)));

  return {
    url: location.href,
    title: document.title,
    documentElement: 0,
    body: document.body && index.has(document.body) ? index.get(document.body) : null,
    inspected,
    elements,
    styleSheets,
    mediaQueries,
    supportsQueries,
    baseline: probeBaseline(tags)
  };
}

async function run() {
  let browser;
  try {
    const { chromium } = require('playwright');
    browser = await chromium.launch({ headless: headlessFlag !== '0' });
    const context = await browser.newContext({
      viewport: { width: parseInt(width, 10), height: parseInt(height, 10) },
      deviceScaleFactor: parseFloat(scale) || 1
    });
    const page = await context.newPage();
    await page.goto(url, { waitUntil: 'networkidle', timeout: parseInt(navTimeout, 10) });
    await page.waitForLoadState('networkidle', { timeout: parseInt(idleTimeout, 10) });

    const model = await page.evaluate(serializePage, inspectSelector || '');
    console.log(JSON.stringify({ status: 'ok', page: model }));
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    console.error(JSON.stringify({ status: 'error', message }));
    process.exitCode = 1;
  } finally {
    if (browser) {
      await browser.close();
    }
  }
}

run();
"#;

/// Captures the viewport, an element's box or the whole page into a PNG.
///
/// argv: url, width, height, scale, navMs, idleMs, headless, target,
/// selector, outputPath, scrollSettleMs, settleMs
pub(crate) const CAPTURE_SCRIPT: &str = r#"
const [, url, width, height, scale, navTimeout, idleTimeout, headlessFlag, target, selector, outputPath, scrollSettle, settleDelay] = process.argv;

const fs = require('fs');
const sleep = (ms) => new Promise((resolve) => setTimeout(resolve, ms));

async function captureFullPage(context, page) {
  const client = await context.newCDPSession(page);
  try {
    await client.send('Page.enable');
    const saved = await client.send('Runtime.evaluate', {
      expression: 'JSON.stringify({ x: window.scrollX, y: window.scrollY })',
      returnByValue: true
    });
    const scroll = JSON.parse(saved.result.value);

    await client.send('Runtime.evaluate', { expression: 'window.scrollTo(0, 0)' });
    await sleep(parseInt(scrollSettle, 10));

    const metrics = await client.send('Page.getLayoutMetrics');
    const size = metrics.cssContentSize || metrics.contentSize;
    const fullWidth = Math.ceil(size.width);
    const fullHeight = Math.ceil(size.height);

    await client.send('Emulation.setDeviceMetricsOverride', {
      width: fullWidth,
      height: fullHeight,
      deviceScaleFactor: 1,
      mobile: false,
      screenWidth: fullWidth,
      screenHeight: fullHeight
    });
    await client.send('Runtime.evaluate', {
      expression: 'new Promise((resolve) => requestAnimationFrame(() => requestAnimationFrame(resolve)))',
      awaitPromise: true
    });
    await sleep(parseInt(settleDelay, 10));

    const shot = await client.send('Page.captureScreenshot', {
      format: 'png',
      captureBeyondViewport: true,
      fromSurface: true
    });

    await client.send('Emulation.clearDeviceMetricsOverride');
    await client.send('Runtime.evaluate', { expression: `window.scrollTo(${scroll.x}, ${scroll.y})` });
    fs.writeFileSync(outputPath, Buffer.from(shot.data, 'base64'));
  } catch (err) {
    try { await client.send('Emulation.clearDeviceMetricsOverride'); } catch (_) {}
    throw err;
  } finally {
    try { await client.detach(); } catch (_) {}
  }
}

async function run() {
  let browser;
  let stage = 'navigate';
  try {
    const { chromium } = require('playwright');
    browser = await chromium.launch({ headless: headlessFlag !== '0' });
    const context = await browser.newContext({
      viewport: { width: parseInt(width, 10), height: parseInt(height, 10) },
      deviceScaleFactor: parseFloat(scale) || 1
    });
    const page = await context.newPage();
    await page.goto(url, { waitUntil: 'networkidle', timeout: parseInt(navTimeout, 10) });
    await page.waitForLoadState('networkidle', { timeout: parseInt(idleTimeout, 10) });

    stage = 'capture';
    let result;
    if (target === 'element') {
      const bounds = await page.evaluate((sel) => {
        const el = document.querySelector(sel);
        if (!el) return { error: 'Element not found' };
        const rect = el.getBoundingClientRect();
        return {
          x: rect.x,
          y: rect.y,
          width: rect.width,
          height: rect.height,
          devicePixelRatio: window.devicePixelRatio || 1,
          scrollX: window.scrollX,
          scrollY: window.scrollY,
          tagName: el.tagName.toLowerCase(),
          id: el.id || '',
          className: typeof el.className === 'string' ? el.className : (el.getAttribute('class') || ''),
          hostname: location.hostname
        };
      }, selector);
      if (bounds.error) {
        throw new Error(bounds.error);
      }
      if (bounds.width === 0 || bounds.height === 0) {
        throw new Error('Element has zero dimensions');
      }
      await page.screenshot({ path: outputPath, fullPage: false });
      result = { action: 'captureElement', bounds, devicePixelRatio: bounds.devicePixelRatio };
    } else if (target === 'full-page') {
      await captureFullPage(context, page);
      result = { action: 'captureFullPage' };
    } else {
      await page.screenshot({ path: outputPath, fullPage: false });
      result = { action: 'captureVisibleTab' };
    }

    const info = await page.evaluate(() => ({ title: document.title, hostname: location.hostname }));
    console.log(JSON.stringify(Object.assign({ status: 'ok', imagePath: outputPath }, info, result)));
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    console.error(JSON.stringify({ status: 'error', stage, message }));
    process.exitCode = 1;
  } finally {
    if (browser) {
      await browser.close();
    }
  }
}

run();
"#;

/// Timeout for checking node/playwright availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Script to check if Playwright is installed.
const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// Page model path used instead of launching a browser for `extract`.
pub const MOCK_PAGE_ENV: &str = "SDUMP_MOCK_PAGE";

/// Capture helper output used instead of launching a browser for `capture`.
pub const MOCK_CAPTURE_ENV: &str = "SDUMP_MOCK_CAPTURE";

/// Status envelope shared by both scripts.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ScriptResult {
    pub status: String,
    pub message: Option<String>,
}

/// Error result from a Playwright script.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ScriptError {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub stage: Option<String>,
}

/// Maps a spawn error to an appropriate SdumpError.
pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> SdumpError {
    if err.kind() == io::ErrorKind::NotFound {
        SdumpError::Config(format!(
            "Unable to spawn Playwright helper; '{}' was not found on PATH",
            command
        ))
    } else {
        SdumpError::Io(err)
    }
}

/// Maps Playwright stderr output to an appropriate SdumpError.
pub(crate) fn map_playwright_error(status_text: impl Into<String>, stderr: &str) -> SdumpError {
    let last_line = stderr.trim().lines().last().unwrap_or_default();
    if let Ok(error) = serde_json::from_str::<ScriptError>(last_line) {
        if error.stage.as_deref() == Some("capture") {
            return CaptureError::from_helper_message(&error.message).into();
        }
        return map_playwright_status_error(&error.status, error.message);
    }

    let lower = stderr.to_ascii_lowercase();

    if lower.contains("cannot find module 'playwright'") {
        return SdumpError::Config(
            "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
        );
    }

    if lower.contains("timeout") {
        return SdumpError::Config(
            "Playwright timed out; try increasing --nav-timeout/--network-idle-timeout or --process-timeout, and ensure the page finishes loading."
                .to_string(),
        );
    }

    SdumpError::Config(format!(
        "Playwright exited with status {}: {}",
        status_text.into(),
        stderr.trim()
    ))
}

/// Maps a Playwright status error to an appropriate SdumpError.
pub(crate) fn map_playwright_status_error(status: &str, message: String) -> SdumpError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("cannot find module 'playwright'") {
        SdumpError::Config(
            "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
        )
    } else if lower.contains("executable doesn't exist") {
        SdumpError::Config(format!(
            "Playwright chromium executable is missing: {}",
            message
        ))
    } else if lower.contains("timeout") {
        SdumpError::Config(format!(
            "Playwright error (status {}): {}. Hint: increase --nav-timeout/--network-idle-timeout or --process-timeout, and ensure the page finishes loading.",
            status, message
        ))
    } else {
        SdumpError::Config(format!("Playwright error (status {}): {}", status, message))
    }
}

/// Checks if mock rendering is enabled via environment variables.
pub(crate) fn is_mock_rendering_enabled() -> bool {
    mock_path(MOCK_PAGE_ENV).is_some() || mock_path(MOCK_CAPTURE_ENV).is_some()
}

pub(crate) fn mock_path(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Ensures Node.js is available on the system.
pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            SdumpError::Config(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(SdumpError::Config(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

/// Ensures Playwright npm package is installed.
pub(crate) async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    if is_mock_rendering_enabled() {
        return Ok(());
    }

    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            SdumpError::Config(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_playwright_error(
            format!("{:?}", output.status),
            &stderr,
        ));
    }

    Ok(())
}
