//! Embeddable browser widget generation.
//!
//! Pure string templating: given a client id and a primary brand color,
//! produce the self-contained script a customer pastes into their page. The
//! script injects its own styles and markup, talks to `/api/query` and
//! `/api/stop`, and renders replies as markdown with a typing effect.
//! No state, no concurrency.

/// Default primary color used when the caller supplies none.
pub const DEFAULT_PRIMARY_COLOR: &str = "#b894f7";

/// Translucent variant of the default primary color.
const DEFAULT_PRIMARY_LIGHT: &str = "rgba(184, 148, 247, 0.1)";

/// Parse a `#rrggbb` color into its RGB components.
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Generate the widget script for one client.
///
/// The translucent `--ai-primary-light` variant is derived from the primary
/// color when it parses as `#rrggbb`; otherwise the default lilac is used.
#[must_use]
pub fn widget_script(client_id: &str, primary_color: &str) -> String {
    let primary_light = parse_hex_color(primary_color).map_or_else(
        || DEFAULT_PRIMARY_LIGHT.to_string(),
        |(r, g, b)| format!("rgba({r}, {g}, {b}, 0.1)"),
    );

    let mut script = String::with_capacity(16 * 1024);

    script.push_str(&format!(
        r#"
    (function() {{
        const clientId = "{client_id}";

        // Add marked.js for markdown rendering
        const markedScript = document.createElement('script');
        markedScript.src = 'https://cdn.jsdelivr.net/npm/marked/marked.min.js';
        document.head.appendChild(markedScript);

        const styles = `
            <style>
                :root {{
                    --ai-primary-color: {primary_color};
                    --ai-primary-light: {primary_light};
                    --ai-background: #ffffff;
                    --ai-secondary-bg: #f8f9fa;
                    --ai-border: #eef0f2;
                    --ai-text: #111827;
                    --ai-secondary-text: #6b7280;
                }}
"#
    ));
    script.push_str(WIDGET_STYLES);
    script.push_str(WIDGET_MARKUP);
    script.push_str(WIDGET_LOGIC);
    script
}

/// Widget styles below the `:root` block; no interpolation needed.
const WIDGET_STYLES: &str = r"
                #ai-search-widget {
                    width: 600px;
                    max-width: 90%;
                    margin: 12px auto;
                    background: var(--ai-background);
                    border-radius: 16px;
                    box-shadow: 0 4px 24px rgba(0, 0, 0, 0.12);
                    font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
                    transition: all 0.3s ease;
                    overflow: hidden;
                }

                #ai-search-container {
                    padding: 12px;
                    position: relative;
                }

                .input-wrapper {
                    position: relative;
                    display: flex;
                    align-items: center;
                }

                #ai-search-input {
                    width: 100%;
                    padding: 12px 40px 12px 16px;
                    border: 2px solid var(--ai-border);
                    border-radius: 12px;
                    font-size: 16px;
                    outline: none;
                    transition: all 0.2s ease;
                    background: var(--ai-secondary-bg);
                    box-sizing: border-box;
                    color: var(--ai-text);
                }

                #ai-search-input:focus {
                    border-color: var(--ai-primary-color);
                    background: var(--ai-background);
                    box-shadow: 0 0 0 4px var(--ai-primary-light);
                }

                #ai-search-input::placeholder {
                    color: var(--ai-secondary-text);
                }

                .send-button, .stop-button {
                    position: absolute;
                    right: 12px;
                    top: 50%;
                    transform: translateY(-50%);
                    background: none;
                    border: none;
                    cursor: pointer;
                    padding: 8px;
                    border-radius: 8px;
                    transition: all 0.2s ease;
                    display: flex;
                    align-items: center;
                    justify-content: center;
                }

                .stop-button {
                    display: none;
                }

                .stop-button.active {
                    display: flex;
                }

                .send-button.hidden {
                    display: none;
                }

                .send-button:hover, .stop-button:hover {
                    background: var(--ai-secondary-bg);
                }

                .send-icon, .stop-icon {
                    width: 20px;
                    height: 20px;
                    fill: var(--ai-primary-color);
                }

                #ai-search-results {
                    display: none;
                    padding: 20px;
                    max-height: 500px;
                    overflow-y: auto;
                    border-top: 1px solid var(--ai-border);
                    margin-top: 20px;
                }

                #ai-search-results.active {
                    display: block;
                }

                .message {
                    margin-bottom: 20px;
                    line-height: 1.6;
                    font-size: 15px;
                    color: var(--ai-text);
                }

                .message:last-child {
                    margin-bottom: 0;
                }

                .message-content {
                    padding: 16px 20px;
                    border-radius: 12px;
                    background: var(--ai-primary-light);
                    font-size: 15px;
                    line-height: 1.6;
                }

                /* Markdown styles */
                .message-content pre {
                    background: var(--ai-background);
                    border-radius: 8px;
                    padding: 12px 16px;
                    overflow-x: auto;
                    margin: 8px 0;
                }

                .message-content code {
                    font-family: 'Menlo', 'Monaco', 'Courier New', monospace;
                    font-size: 13px;
                    background: var(--ai-background);
                    padding: 2px 4px;
                    border-radius: 4px;
                }

                .message-content p {
                    margin: 0 0 12px 0;
                }

                .message-content p:last-child {
                    margin-bottom: 0;
                }

                .message-content ul,
                .message-content ol {
                    margin: 8px 0;
                    padding-left: 24px;
                }

                .message-content li {
                    margin: 4px 0;
                }

                .message-content a {
                    color: var(--ai-primary-color);
                    text-decoration: none;
                }

                .message-content a:hover {
                    text-decoration: underline;
                }

                .message-content blockquote {
                    border-left: 4px solid var(--ai-border);
                    margin: 8px 0;
                    padding-left: 16px;
                    color: var(--ai-secondary-text);
                }

                .message-content table {
                    border-collapse: collapse;
                    width: 100%;
                    margin: 12px 0;
                }

                .message-content th,
                .message-content td {
                    border: 1px solid var(--ai-border);
                    padding: 8px 12px;
                    text-align: left;
                }

                .message-content th {
                    background: var(--ai-secondary-bg);
                }

                #typing-indicator {
                    display: flex;
                    align-items: center;
                    justify-content: center;
                    padding: 20px;
                }

                .generating {
                    display: flex;
                    align-items: center;
                    gap: 12px;
                    padding: 16px 20px;
                    background: var(--ai-primary-light);
                    border-radius: 12px;
                    color: var(--ai-primary-color);
                }

                .typing-animation {
                    display: flex;
                    align-items: center;
                    gap: 4px;
                }

                .typing-dot {
                    width: 4px;
                    height: 4px;
                    background: currentColor;
                    border-radius: 50%;
                    animation: typingAnimation 1.4s infinite;
                    opacity: 0.3;
                }

                .typing-dot:nth-child(1) { animation-delay: 0s; }
                .typing-dot:nth-child(2) { animation-delay: 0.2s; }
                .typing-dot:nth-child(3) { animation-delay: 0.4s; }

                @keyframes typingAnimation {
                    0% { opacity: 0.3; transform: translateY(0); }
                    50% { opacity: 1; transform: translateY(-4px); }
                    100% { opacity: 0.3; transform: translateY(0); }
                }

                #ai-search-results::-webkit-scrollbar {
                    width: 8px;
                }

                #ai-search-results::-webkit-scrollbar-track {
                    background: transparent;
                }

                #ai-search-results::-webkit-scrollbar-thumb {
                    background: var(--ai-border);
                    border-radius: 4px;
                }

                #ai-search-results::-webkit-scrollbar-thumb:hover {
                    background: var(--ai-secondary-text);
                }
            </style>
        `;
";

/// Widget markup injected next to the embedding script tag.
const WIDGET_MARKUP: &str = r#"
        const widgetHtml = `
            <div id="ai-search-widget">
                <div id="ai-search-container">
                    <div class="input-wrapper">
                        <input type="text" id="ai-search-input" placeholder="Ask anything..." autocomplete="off">
                        <button class="send-button" aria-label="Send message">
                            <svg class="send-icon" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg">
                                <path d="M2.01 21L23 12 2.01 3 2 10l15 2-15 2z"/>
                            </svg>
                        </button>
                        <button class="stop-button" aria-label="Stop generation">
                            <svg class="stop-icon" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg">
                                <path d="M6 6h12v12H6z"/>
                            </svg>
                        </button>
                    </div>
                    <div id="ai-search-results"></div>
                </div>
            </div>
        `;
"#;

/// Client-side behavior: wiring, query submission, stop, typing effect.
const WIDGET_LOGIC: &str = r#"
        // Inject styles and widget HTML
        document.head.insertAdjacentHTML('beforeend', styles);
        document.currentScript.insertAdjacentHTML('afterend', widgetHtml);

        let threadId = null;
        let currentRunId = null;
        let isGenerating = false;
        const widget = document.getElementById('ai-search-widget');
        const input = document.getElementById('ai-search-input');
        const results = document.getElementById('ai-search-results');
        const sendButton = document.querySelector('.send-button');
        const stopButton = document.querySelector('.stop-button');

        // A click outside the widget resets the conversation entirely.
        document.addEventListener('click', async (e) => {
            const isClickInside = widget.contains(e.target);

            if (!isClickInside) {
                if (isGenerating) {
                    await stopGeneration();
                }

                results.innerHTML = '';
                results.classList.remove('active');
                input.value = '';
                threadId = null;
                currentRunId = null;
                isGenerating = false;
                stopButton.classList.remove('active');
                sendButton.classList.remove('hidden');
            }
        });

        widget.addEventListener('click', (e) => {
            e.stopPropagation();
        });

        async function stopGeneration() {
            if (currentRunId) {
                try {
                    await fetch('/api/stop', {
                        method: 'POST',
                        headers: { 'Content-Type': 'application/json' },
                        body: JSON.stringify({ run_id: currentRunId })
                    });

                    stopButton.classList.remove('active');
                    sendButton.classList.remove('hidden');
                    isGenerating = false;
                    currentRunId = null;
                } catch (error) {
                    console.error('Error stopping generation:', error);
                }
            }
        }

        async function handleQuery() {
            if (isGenerating) return;

            const query = input.value.trim();
            if (!query) return;

            isGenerating = true;
            input.value = '';
            results.classList.add('active');
            stopButton.classList.add('active');
            sendButton.classList.add('hidden');

            results.innerHTML = `
                <div id="typing-indicator">
                    <div class="generating">
                        <div class="typing-animation">
                            <div class="typing-dot"></div>
                            <div class="typing-dot"></div>
                            <div class="typing-dot"></div>
                        </div>
                    </div>
                </div>
            `;

            try {
                const response = await fetch('/api/query', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({
                        client_id: clientId,
                        query: query,
                        thread_id: threadId
                    })
                });

                const data = await response.json();

                if (data.status === 'cancelled') {
                    results.innerHTML = `
                        <div class="message">
                            <div class="message-content">
                                Generation stopped.
                            </div>
                        </div>
                    `;
                    return;
                }

                threadId = data.thread_id;
                currentRunId = data.run_id;

                // Per-character typing effect over the full reply.
                results.innerHTML = `<div class="message"><div class="message-content"></div></div>`;
                const messageContent = results.querySelector('.message-content');
                const responseText = data.response;
                let charIndex = 0;
                let markdown = '';

                function typeNextChar() {
                    if (charIndex < responseText.length && isGenerating) {
                        markdown += responseText[charIndex];
                        messageContent.innerHTML = marked.parse(markdown, {
                            breaks: true,
                            gfm: true
                        });
                        charIndex++;
                        results.scrollTop = results.scrollHeight;
                        setTimeout(typeNextChar, Math.random() * 20 + 10);
                    } else {
                        stopButton.classList.remove('active');
                        sendButton.classList.remove('hidden');
                        isGenerating = false;
                        currentRunId = null;
                    }
                }

                // marked.js may still be loading on the first query.
                if (typeof marked === 'undefined') {
                    markedScript.onload = () => {
                        marked.setOptions({
                            highlight: function(code, lang) {
                                return code;
                            }
                        });
                        typeNextChar();
                    };
                } else {
                    typeNextChar();
                }

            } catch (error) {
                console.error('Error:', error);
                results.innerHTML = `
                    <div class="message">
                        <div class="message-content" style="color: var(--ai-error-color, #dc2626);">
                            Sorry, there was an error generating the response.
                        </div>
                    </div>
                `;
                stopButton.classList.remove('active');
                sendButton.classList.remove('hidden');
                isGenerating = false;
                currentRunId = null;
            }
        }

        input.addEventListener('keypress', (e) => {
            if (e.key === 'Enter' && !isGenerating) {
                handleQuery();
            }
        });

        sendButton.addEventListener('click', handleQuery);
        stopButton.addEventListener('click', stopGeneration);
    })();
"#;
